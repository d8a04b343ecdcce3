//! Classifying an item by asking implication questions of a [`Session`].
//!
//! Each category literal implies one or more domain literals. A domain belongs to a category when
//! the category is consistent with the domain and inconsistent without it.

use crate::formula::dimacs::MAX_VARIABLE;
use crate::session::{Session, SessionError};
use crate::SatResult;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

/// Names and literals for categories and domains, plus the `category -> domain` rules between them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    categories: BTreeMap<String, i32>,
    domains: BTreeMap<String, i32>,
    rules: Vec<(String, String)>,
}

impl ClassifierConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Email from domain A is category A, email from domain B is category B.
    pub fn email() -> Self {
        Self::new()
            .category("A", 1)
            .category("B", 2)
            .domain("A", 3)
            .domain("B", 4)
            .rule("A", "A")
            .rule("B", "B")
    }

    pub fn category(mut self, name: &str, literal: i32) -> Self {
        self.categories.insert(name.to_string(), literal);
        self
    }

    pub fn domain(mut self, name: &str, literal: i32) -> Self {
        self.domains.insert(name.to_string(), literal);
        self
    }

    pub fn rule(mut self, category: &str, domain: &str) -> Self {
        self.rules.push((category.to_string(), domain.to_string()));
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, i32)> {
        self.categories.iter().map(|(name, &l)| (name.as_str(), l))
    }

    pub fn domains(&self) -> impl Iterator<Item = (&str, i32)> {
        self.domains.iter().map(|(name, &l)| (name.as_str(), l))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Category(String),
    Unclassified,
    /// More than one category fits; names in order.
    Ambiguous(Vec<String>),
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            Classification::Category(name) => f.write_str(name),
            Classification::Unclassified => Ok(()),
            Classification::Ambiguous(names) => f.write_str(&names.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    UnknownCategory(String),
    UnknownDomain(String),
    /// Category and domain literals must be distinct, positive variable indices.
    InvalidLiteral(String, i32),
    Session(SessionError),
}

impl From<SessionError> for ClassifyError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

pub struct Classifier {
    config: ClassifierConfig,
    session: Session,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let mut seen = BTreeSet::new();
        for (name, literal) in config.categories().chain(config.domains()) {
            if literal <= 0 || literal as u32 > MAX_VARIABLE || !seen.insert(literal) {
                return Err(ClassifyError::InvalidLiteral(name.to_string(), literal));
            }
        }

        let mut session = Session::new();
        for (category, domain) in &config.rules {
            let c = *config
                .categories
                .get(category)
                .ok_or_else(|| ClassifyError::UnknownCategory(category.clone()))?;
            let d = *config
                .domains
                .get(domain)
                .ok_or_else(|| ClassifyError::UnknownDomain(domain.clone()))?;
            session.add_clause(&[-c, d])?;
        }

        Ok(Self { config, session })
    }

    pub fn eval(&mut self, domain: &str) -> Result<Classification, ClassifyError> {
        let d = match self.config.domains.get(domain) {
            Some(&d) => d,
            None => {
                debug!("unknown domain {:?}", domain);
                return Ok(Classification::Unclassified);
            }
        };

        let mut matches = vec![];
        for (name, &c) in &self.config.categories {
            let with_domain = self.session.solve(&[c, d])?;
            let without_domain = self.session.solve(&[c, -d])?;
            debug!(
                "category {} with domain {}: {:?}, without: {:?}",
                name, domain, with_domain, without_domain
            );
            if with_domain == SatResult::Satisfiable && without_domain == SatResult::Unsatisfiable {
                matches.push(name.clone());
            }
        }

        Ok(match matches.len() {
            0 => Classification::Unclassified,
            1 => Classification::Category(matches.remove(0)),
            _ => Classification::Ambiguous(matches),
        })
    }
}
