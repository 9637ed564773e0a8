use crate::entity_store::EntityStore;
use crate::error::{Error, Result};
use crate::graph::RelationGraph;
use crate::model::{Person, PersonId};
use crate::validate;
use log::info;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct PeopleDirectory {
    people: Arc<EntityStore<Person>>,
    graph: Arc<RelationGraph>,
}

impl PeopleDirectory {
    pub fn new(people: Arc<EntityStore<Person>>, graph: Arc<RelationGraph>) -> Self {
        PeopleDirectory { people, graph }
    }

    fn hydrate(&self, mut person: Person) -> Result<Person> {
        person.friends = self.graph.friend_ids_of(person.id)?;
        Ok(person)
    }

    fn resolve(&self, ids: impl IntoIterator<Item = PersonId>) -> Result<Vec<Person>> {
        ids.into_iter()
            .map(|id| self.people.get(id).and_then(|p| self.hydrate(p)))
            .collect()
    }

    pub fn create(&self, mut person: Person) -> Result<Person> {
        validate::person(&person, validate::today())?;
        if validate::is_blank(&person.display_name) {
            person.display_name = person.login.clone();
        }
        person.friends.clear();
        let created = self.people.create(person)?;
        info!("person {} created: {:?}", created.id, created.login);
        Ok(created)
    }

    /// Replaces every mutable field. The display name is taken as given.
    pub fn update(&self, mut person: Person) -> Result<Person> {
        if person.id == 0 {
            return Err(Error::ConditionsNotMet(
                "cannot update a person with id 0".to_owned(),
            ));
        }
        if !self.people.contains(person.id)? {
            return Err(Error::NotFound(format!(
                "person with id {} not found",
                person.id
            )));
        }
        validate::person(&person, validate::today())?;
        person.friends.clear();
        let updated = self.people.update(person)?;
        info!("person {} updated", updated.id);
        self.hydrate(updated)
    }

    pub fn get_by_id(&self, id: PersonId) -> Result<Person> {
        self.hydrate(self.people.get(id)?)
    }

    pub fn list(&self) -> Result<Vec<Person>> {
        self.people
            .list()?
            .into_iter()
            .map(|p| self.hydrate(p))
            .collect()
    }

    pub fn delete(&self, id: PersonId) -> Result<()> {
        self.people.delete(id)?;
        self.graph.detach_person(id)?;
        info!("person {} deleted", id);
        Ok(())
    }

    pub fn add_friend(&self, person: PersonId, friend: PersonId) -> Result<()> {
        self.people.get(person)?;
        self.people.get(friend)?;
        self.graph.add_friend(person, friend)?;
        info!("person {} befriended {}", person, friend);
        Ok(())
    }

    /// Both people must exist; a missing friendship is not an error.
    pub fn remove_friend(&self, person: PersonId, friend: PersonId) -> Result<()> {
        self.people.get(person)?;
        self.people.get(friend)?;
        self.graph.remove_friend(person, friend)?;
        info!("person {} unfriended {}", person, friend);
        Ok(())
    }

    pub fn friend_ids_of(&self, person: PersonId) -> Result<BTreeSet<PersonId>> {
        self.people.get(person)?;
        self.graph.friend_ids_of(person)
    }

    /// Friends ordered by id.
    pub fn friends_of(&self, person: PersonId) -> Result<Vec<Person>> {
        let ids = self.friend_ids_of(person)?;
        self.resolve(ids)
    }

    /// People both `a` and `b` have befriended, ordered by id.
    pub fn mutual_friends_of(&self, a: PersonId, b: PersonId) -> Result<Vec<Person>> {
        self.people.get(a)?;
        self.people.get(b)?;
        let ids = self.graph.mutual_friend_ids(a, b)?;
        self.resolve(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBackend;
    use crate::error::ErrorKind;
    use chrono::NaiveDate;

    fn directory() -> PeopleDirectory {
        let backend = MemoryBackend::new();
        PeopleDirectory::new(
            Arc::new(EntityStore::open(&backend).unwrap()),
            Arc::new(RelationGraph::open(&backend).unwrap()),
        )
    }

    fn person(login: &str) -> Person {
        Person {
            id: 0,
            email: format!("{}@example.com", login),
            login: login.to_owned(),
            display_name: String::new(),
            birth_date: NaiveDate::from_ymd_opt(1988, 3, 4).unwrap(),
            friends: Default::default(),
        }
    }

    #[test]
    fn create_defaults_display_name() {
        let dir = directory();
        let created = dir.create(person("ann")).unwrap();
        assert_eq!(created.display_name, "ann");

        let mut named = person("bob");
        named.display_name = "Bob B.".to_owned();
        assert_eq!(dir.create(named).unwrap().display_name, "Bob B.");

        let mut blank = person("cid");
        blank.display_name = "   ".to_owned();
        assert_eq!(dir.create(blank).unwrap().display_name, "cid");
    }

    #[test]
    fn get_returns_what_was_created() {
        let dir = directory();
        let mut p = person("ann");
        p.friends.insert(7);
        let created = dir.create(p).unwrap();
        assert!(created.friends.is_empty());
        assert_eq!(dir.get_by_id(created.id).unwrap(), created);
    }

    #[test]
    fn update_keeps_name_as_given() {
        let dir = directory();
        let created = dir.create(person("ann")).unwrap();
        let mut changed = created.clone();
        changed.display_name = String::new();
        changed.email = "ann@other.org".to_owned();
        let updated = dir.update(changed).unwrap();
        assert_eq!(updated.display_name, "");
        assert_eq!(dir.get_by_id(created.id).unwrap().email, "ann@other.org");

        assert_eq!(
            dir.update(person("zero")).unwrap_err().kind(),
            ErrorKind::ConditionsNotMet
        );
        let mut ghost = person("ghost");
        ghost.id = 50;
        assert_eq!(dir.update(ghost).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn invalid_people_are_rejected() {
        let dir = directory();
        let mut p = person("ann");
        p.login = "a n n".to_owned();
        assert_eq!(dir.create(p).unwrap_err().kind(), ErrorKind::InvalidArgument);
        let mut p = person("ann");
        p.email = "ann.example.com".to_owned();
        assert_eq!(dir.create(p).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert!(dir.list().unwrap().is_empty());
    }

    #[test]
    fn ids_keep_growing_across_deletes() {
        let dir = directory();
        let ids = (0..3)
            .map(|i| dir.create(person(&format!("p{}", i))).unwrap().id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
        dir.delete(3).unwrap();
        assert_eq!(dir.create(person("again")).unwrap().id, 4);
    }

    #[test]
    fn friendship() {
        let dir = directory();
        let a = dir.create(person("a")).unwrap().id;
        let b = dir.create(person("b")).unwrap().id;

        dir.add_friend(a, b).unwrap();
        dir.add_friend(a, b).unwrap();
        assert_eq!(dir.friend_ids_of(a).unwrap(), BTreeSet::from([b]));
        assert!(dir.friend_ids_of(b).unwrap().is_empty());
        assert_eq!(dir.get_by_id(a).unwrap().friends, BTreeSet::from([b]));

        let friends = dir.friends_of(a).unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].login, "b");

        dir.remove_friend(b, a).unwrap();
        dir.remove_friend(a, b).unwrap();
        assert!(dir.friends_of(a).unwrap().is_empty());

        assert_eq!(dir.add_friend(a, 99).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(dir.friends_of(99).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn mutual_friends() {
        let dir = directory();
        let ids = (1..=7)
            .map(|i| dir.create(person(&format!("p{}", i))).unwrap().id)
            .collect::<Vec<_>>();
        assert_eq!(ids, (1..=7u64).collect::<Vec<_>>());
        for f in &[2, 3, 4] {
            dir.add_friend(6, *f).unwrap();
        }
        for f in &[3, 4, 5] {
            dir.add_friend(7, *f).unwrap();
        }
        let mutual = dir
            .mutual_friends_of(6, 7)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect::<Vec<_>>();
        assert_eq!(mutual, vec![3, 4]);

        assert_eq!(
            dir.mutual_friends_of(6, 99).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn delete_removes_every_friendship() {
        let dir = directory();
        let a = dir.create(person("a")).unwrap().id;
        let b = dir.create(person("b")).unwrap().id;
        let c = dir.create(person("c")).unwrap().id;
        dir.add_friend(a, b).unwrap();
        dir.add_friend(c, b).unwrap();
        dir.add_friend(b, a).unwrap();

        dir.delete(b).unwrap();

        assert!(dir.friend_ids_of(a).unwrap().is_empty());
        assert!(dir.friend_ids_of(c).unwrap().is_empty());
        assert_eq!(dir.get_by_id(b).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(dir.delete(b).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
