//! BGP table reconstruction from raw router captures

pub mod expand;
pub mod parser;
pub mod prefixes;
pub mod records;
pub mod reduce;

pub use expand::{expand, expand_all};
pub use parser::{ParseOutput, ParseStats, ReportVariant, TableParser};
pub use prefixes::{ReferencePrefix, ReferencePrefixSet};
pub use records::{asn_number, normalize_asn, NetworkRecord, OriginAttribute, OriginRecord};
pub use reduce::{reduce, Reduced};
