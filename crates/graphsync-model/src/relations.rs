//! Static relationship-type vocabulary
//!
//! Link types that are not terms of any vocabulary but are understood by the
//! diagram model directly. A link whose type is neither one of these nor a
//! cached term is invalid.

/// Namespace of the foundational relationship types
pub const FOUNDATION_NS: &str = "https://slovník.gov.cz/základní/pojem/";

/// `rdfs:subClassOf`
pub const SPECIALIZATION: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

/// has-property
pub const HAS_PROPERTY: &str = "https://slovník.gov.cz/základní/pojem/má-vlastnost";

/// is-property-of
pub const IS_PROPERTY_OF: &str = "https://slovník.gov.cz/základní/pojem/je-vlastností";

/// has-part
pub const HAS_PART: &str = "https://slovník.gov.cz/základní/pojem/má-část";

/// is-part-of
pub const IS_PART_OF: &str = "https://slovník.gov.cz/základní/pojem/je-částí";

/// Binding of a reified relation to its first endpoint
pub const RELATED_ELEMENT_1: &str = "https://slovník.gov.cz/základní/pojem/má-vztažený-prvek-1";

/// Binding of a reified relation to its second endpoint
pub const RELATED_ELEMENT_2: &str = "https://slovník.gov.cz/základní/pojem/má-vztažený-prvek-2";

/// Every static relationship type
pub const STATIC_RELATIONS: &[&str] = &[
    SPECIALIZATION,
    HAS_PROPERTY,
    IS_PROPERTY_OF,
    HAS_PART,
    IS_PART_OF,
    RELATED_ELEMENT_1,
    RELATED_ELEMENT_2,
];

/// Whether `iri` belongs to the static relationship vocabulary
#[inline]
#[must_use]
pub fn is_static_relation(iri: &str) -> bool {
    STATIC_RELATIONS.iter().any(|r| *r == iri)
}
