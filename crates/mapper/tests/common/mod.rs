//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use nebula_mapper::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Visitor,
    User,
    Admin,
}

impl Enumeration for Role {
    fn variants() -> &'static [Self] {
        &[Role::Visitor, Role::User, Role::Admin]
    }

    fn name(self) -> &'static str {
        match self {
            Role::Visitor => "visitor",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl_typed_enum!(Role);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseEntity {
    pub id: Option<i64>,
}

impl Record for BaseEntity {
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
        builder
            .default_constructor()
            .field("id", |e| &e.id, |e| &mut e.id)
    }
}

impl_typed_record!(BaseEntity);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Company {
    pub name: String,
    pub since: Option<i32>,
}

impl Record for Company {
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
        builder
            .default_constructor()
            .field("name", |c| &c.name, |c| &mut c.name)
            .field("since", |c| &c.since, |c| &mut c.since)
    }
}

impl_typed_record!(Company);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub base: BaseEntity,
    pub username: String,
    pub since: Option<i32>,
    pub role: Option<Role>,
    pub company: Option<Company>,
    pub tags: Vec<String>,
    pub joined: Option<NaiveDate>,
    pub password: String,
}

impl Record for User {
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
        builder
            .extends(|u| &u.base, |u| &mut u.base)
            .default_constructor()
            .field("username", |u| &u.username, |u| &mut u.username)
            .field("since", |u| &u.since, |u| &mut u.since)
            .field("role", |u| &u.role, |u| &mut u.role)
            .field("company", |u| &u.company, |u| &mut u.company)
            .field("tags", |u| &u.tags, |u| &mut u.tags)
            .field("joined", |u| &u.joined, |u| &mut u.joined)
            .write_only("password", |u, password: String| u.password = password)
    }
}

impl_typed_record!(User);

/// Tree node; used to build self-referencing inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub children: Vec<Node>,
}

impl Record for Node {
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
        builder
            .default_constructor()
            .field("name", |n| &n.name, |n| &mut n.name)
            .field("children", |n| &n.children, |n| &mut n.children)
    }
}

impl_typed_record!(Node);

/// Record without a construction path.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
}

impl Record for Token {
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
        builder.field("value", |t| &t.value, |t| &mut t.value)
    }
}

impl_typed_record!(Token);

pub fn johnd() -> User {
    User {
        base: BaseEntity { id: Some(1) },
        username: "johnd".to_owned(),
        since: Some(1997),
        role: Some(Role::Admin),
        company: Some(Company {
            name: "Nike".to_owned(),
            since: Some(1964),
        }),
        tags: vec!["a".to_owned(), "b".to_owned()],
        joined: NaiveDate::from_ymd_opt(2020, 1, 2),
        password: "secret".to_owned(),
    }
}
