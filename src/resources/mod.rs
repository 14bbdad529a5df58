//! # Resources
//!
//! One module per browsable entity, each declaring its [`FilterConfig`].
//! The [`Catalog`] owns the lookup caches and every configuration and is
//! built once at startup.

use std::sync::Arc;

use sea_orm::ConnectionTrait;

use crate::errors::{CatalogError, ConfigError};
use crate::filtering::config::FilterConfig;
use crate::lookup::{LookupSource, LookupTable};

pub mod classes;
pub mod feat_benefits;
pub mod feats;
pub mod race_traits;
pub mod races;
pub mod reference_tables;
pub mod skills;
pub mod spells;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Spells,
    Classes,
    Races,
    RaceTraits,
    Skills,
    Feats,
    FeatBenefits,
    ReferenceTables,
}

impl Resource {
    pub const ALL: [Self; 8] = [
        Self::Spells,
        Self::Classes,
        Self::Races,
        Self::RaceTraits,
        Self::Skills,
        Self::Feats,
        Self::FeatBenefits,
        Self::ReferenceTables,
    ];

    /// Name used in logs and the `Content-Range` header.
    pub fn name(self) -> &'static str {
        match self {
            Self::Spells => "spells",
            Self::Classes => "classes",
            Self::Races => "races",
            Self::RaceTraits => "race_traits",
            Self::Skills => "skills",
            Self::Feats => "feats",
            Self::FeatBenefits => "feat_benefits",
            Self::ReferenceTables => "reference_tables",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Spells => "/spells",
            Self::Classes => "/classes",
            Self::Races => "/races",
            Self::RaceTraits => "/race-traits",
            Self::Skills => "/skills",
            Self::Feats => "/feats",
            Self::FeatBenefits => "/feat-benefits",
            Self::ReferenceTables => "/reference-tables",
        }
    }
}

/// Reference tables used to resolve filter values to ids.
#[derive(Debug, Clone)]
pub struct Lookups {
    pub schools: Arc<LookupTable>,
    pub subschools: Arc<LookupTable>,
    pub descriptors: Arc<LookupTable>,
    pub components: Arc<LookupTable>,
    pub sources: Arc<LookupTable>,
    pub classes: Arc<LookupTable>,
    pub editions: Arc<LookupTable>,
}

impl Lookups {
    /// Uninitialized tables backed by the reference schema.
    pub fn new() -> Self {
        Self {
            schools: table("schools", LookupSource::new("spell_schools", "school_id", &["school_name"])),
            subschools: table(
                "subschools",
                LookupSource::new("spell_subschools", "sub_id", &["subschool"]),
            ),
            descriptors: table(
                "descriptors",
                LookupSource::new("spell_descriptors", "desc_id", &["descriptor"]),
            ),
            components: table(
                "components",
                LookupSource::new("spell_components", "comp_id", &["comp_name", "comp_abbrev"]),
            ),
            sources: table(
                "sources",
                LookupSource::new("source_books", "book_id", &["title", "abbrev_title"])
                    .with_condition("display = 1"),
            ),
            classes: table(
                "classes",
                LookupSource::new("classes", "class_id", &["class_name", "class_abbr"])
                    .with_condition("display = 1"),
            ),
            editions: table("editions", LookupSource::new("editions", "edition_id", &["edition_abbrev"])),
        }
    }

    fn all(&self) -> [&Arc<LookupTable>; 7] {
        [
            &self.schools,
            &self.subschools,
            &self.descriptors,
            &self.components,
            &self.sources,
            &self.classes,
            &self.editions,
        ]
    }

    /// Load every table.
    ///
    /// # Errors
    ///
    /// Returns the first [`CacheError`](crate::errors::CacheError) encountered.
    pub async fn load_all<C: ConnectionTrait>(&self, db: &C) -> Result<(), CatalogError> {
        for table in self.all() {
            table.load(db).await?;
        }
        Ok(())
    }
}

impl Default for Lookups {
    fn default() -> Self {
        Self::new()
    }
}

fn table(name: &'static str, source: LookupSource) -> Arc<LookupTable> {
    Arc::new(LookupTable::new(name, source))
}

/// Every entity configuration, sharing one set of lookups.
#[derive(Debug, Clone)]
pub struct Catalog {
    lookups: Lookups,
    spells: Arc<FilterConfig>,
    classes: Arc<FilterConfig>,
    races: Arc<FilterConfig>,
    race_traits: Arc<FilterConfig>,
    skills: Arc<FilterConfig>,
    feats: Arc<FilterConfig>,
    feat_benefits: Arc<FilterConfig>,
    reference_tables: Arc<FilterConfig>,
}

impl Catalog {
    /// Build every configuration against `lookups`, loaded or not.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any configuration is invalid.
    pub fn new(lookups: Lookups) -> Result<Self, ConfigError> {
        Ok(Self {
            spells: Arc::new(spells::config(&lookups)?),
            classes: Arc::new(classes::config(&lookups)?),
            races: Arc::new(races::config(&lookups)?),
            race_traits: Arc::new(race_traits::config()?),
            skills: Arc::new(skills::config()?),
            feats: Arc::new(feats::config()?),
            feat_benefits: Arc::new(feat_benefits::config()?),
            reference_tables: Arc::new(reference_tables::config()?),
            lookups,
        })
    }

    /// Load the lookup caches from `db` and build the catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a cache fails to load or a configuration
    /// is invalid.
    pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Self, CatalogError> {
        let lookups = Lookups::new();
        lookups.load_all(db).await?;
        let catalog = Self::new(lookups)?;
        tracing::info!(resources = Resource::ALL.len(), "resource catalog ready");
        Ok(catalog)
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn config(&self, resource: Resource) -> &Arc<FilterConfig> {
        match resource {
            Resource::Spells => &self.spells,
            Resource::Classes => &self.classes,
            Resource::Races => &self.races,
            Resource::RaceTraits => &self.race_traits,
            Resource::Skills => &self.skills,
            Resource::Feats => &self.feats,
            Resource::FeatBenefits => &self.feat_benefits,
            Resource::ReferenceTables => &self.reference_tables,
        }
    }
}
