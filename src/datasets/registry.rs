//! Named OOD detection datasets.
//!
//! Maps string identifiers such as `"cifar10_vs_cifar100"` to the pair of
//! corpora they compose. The corpora themselves come from a
//! [`CorpusProvider`], which owns fetching and decoding.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::DatasetError;

use super::ood::OodDetectionDataset;
use super::source::DataSource;

/// A boxed single-corpus source.
pub type BoxedSource = Box<dyn DataSource>;

/// An OOD detection dataset over boxed corpora.
pub type BoxedOodDataset = OodDetectionDataset<BoxedSource, BoxedSource>;

/// Single-corpus sources that named datasets are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corpus {
    Cifar10,
    Cifar100,
}

impl Corpus {
    /// Returns the corpus identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Corpus::Cifar10 => "cifar10",
            Corpus::Cifar100 => "cifar100",
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Back-end that decodes corpora into data sources.
pub trait CorpusProvider {
    fn corpus(&self, corpus: Corpus) -> Result<BoxedSource, DatasetError>;
}

/// Registered OOD detection datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OodPair {
    /// CIFAR-10 in-distribution, CIFAR-100 out-of-distribution.
    Cifar10VsCifar100,
    /// CIFAR-100 in-distribution, CIFAR-10 out-of-distribution.
    Cifar100VsCifar10,
}

impl OodPair {
    /// Returns all registered datasets.
    pub fn all() -> Vec<OodPair> {
        vec![OodPair::Cifar10VsCifar100, OodPair::Cifar100VsCifar10]
    }

    /// Returns the registry identifier.
    pub fn name(&self) -> &'static str {
        match self {
            OodPair::Cifar10VsCifar100 => "cifar10_vs_cifar100",
            OodPair::Cifar100VsCifar10 => "cifar100_vs_cifar10",
        }
    }

    pub fn in_corpus(&self) -> Corpus {
        match self {
            OodPair::Cifar10VsCifar100 => Corpus::Cifar10,
            OodPair::Cifar100VsCifar10 => Corpus::Cifar100,
        }
    }

    pub fn out_corpus(&self) -> Corpus {
        match self {
            OodPair::Cifar10VsCifar100 => Corpus::Cifar100,
            OodPair::Cifar100VsCifar10 => Corpus::Cifar10,
        }
    }

    /// Builds the composed dataset from corpora supplied by `provider`.
    pub fn build(&self, provider: &dyn CorpusProvider) -> Result<BoxedOodDataset, DatasetError> {
        let in_source = provider.corpus(self.in_corpus())?;
        let out_source = provider.corpus(self.out_corpus())?;
        let dataset = OodDetectionDataset::new(in_source, out_source)?;
        info!(
            dataset = self.name(),
            in_corpus = %self.in_corpus(),
            out_corpus = %self.out_corpus(),
            "built OOD detection dataset"
        );
        Ok(dataset)
    }
}

impl fmt::Display for OodPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OodPair {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OodPair::all()
            .into_iter()
            .find(|pair| pair.name() == s)
            .ok_or_else(|| DatasetError::UnknownDataset(s.to_string()))
    }
}
