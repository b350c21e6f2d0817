//! Role-scoped read predicates and mutation rights.
//!
//! Both are pure functions of the actor. Read scope and write scope are
//! computed independently: governorate staff read a whole governorate but
//! never write.

use crate::models::{Actor, Administration, Complaint, Governorate, Role};

/// Single equality clause over a complaint field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    Email(String),
    Administration(Administration),
    Governorate(Governorate),
    ComplaintId(String),
}

impl FieldMatch {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        match self {
            FieldMatch::Email(email) => complaint.email == *email,
            FieldMatch::Administration(a) => complaint.administration == *a,
            FieldMatch::Governorate(g) => complaint.governorate == *g,
            FieldMatch::ComplaintId(id) => complaint.complaint_id == *id,
        }
    }
}

/// Listing predicate for an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadScope {
    /// Whole collection
    All,
    /// Conjunction of equality clauses
    Where(Vec<FieldMatch>),
    /// Matches no record
    Nothing,
}

impl ReadScope {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        match self {
            ReadScope::All => true,
            ReadScope::Where(clauses) => clauses.iter().all(|c| c.matches(complaint)),
            ReadScope::Nothing => false,
        }
    }

    /// Narrow the scope with one more clause.
    pub fn and(self, clause: FieldMatch) -> ReadScope {
        match self {
            ReadScope::All => ReadScope::Where(vec![clause]),
            ReadScope::Where(mut clauses) => {
                clauses.push(clause);
                ReadScope::Where(clauses)
            }
            ReadScope::Nothing => ReadScope::Nothing,
        }
    }
}

/// Complaints an actor may mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScope {
    All,
    Department {
        administration: Administration,
        governorate: Governorate,
    },
    None,
}

impl WriteScope {
    pub fn permits(&self, complaint: &Complaint) -> bool {
        match self {
            WriteScope::All => true,
            WriteScope::Department {
                administration,
                governorate,
            } => complaint.administration == *administration && complaint.governorate == *governorate,
            WriteScope::None => false,
        }
    }
}

pub fn read_scope(actor: &Actor) -> ReadScope {
    match actor.role {
        Role::Citizen => match actor.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => {
                ReadScope::Where(vec![FieldMatch::Email(email.to_string())])
            }
            _ => ReadScope::Nothing,
        },
        Role::Department => match (actor.administration, actor.governorate) {
            (Some(administration), Some(governorate)) => ReadScope::Where(vec![
                FieldMatch::Administration(administration),
                FieldMatch::Governorate(governorate),
            ]),
            _ => ReadScope::Nothing,
        },
        Role::Governorate => match actor.governorate {
            Some(governorate) => ReadScope::Where(vec![FieldMatch::Governorate(governorate)]),
            None => ReadScope::Nothing,
        },
        Role::Moderator => ReadScope::All,
    }
}

pub fn write_scope(actor: &Actor) -> WriteScope {
    match actor.role {
        Role::Department => match (actor.administration, actor.governorate) {
            (Some(administration), Some(governorate)) => WriteScope::Department {
                administration,
                governorate,
            },
            _ => WriteScope::None,
        },
        Role::Moderator => WriteScope::All,
        Role::Citizen | Role::Governorate => WriteScope::None,
    }
}
