//! Query builder collaborator
//!
//! The engine never writes query text itself; it asks a [`QueryBuilder`].
//! [`SparqlQueryBuilder`] is the default, storing diagrams, elements and
//! links in the application context graph.
//!
//! Every generated text starts with a `# graphsync:<kind>` comment line so
//! that logs and test doubles can tell the queries apart.

use graphsync_model::{Diagram, Element, Iri, Link};

/// Query kinds
pub mod kinds {
    /// Vocabulary discovery over context graphs
    pub const VOCABULARY_CONTEXTS: &str = "vocabulary-contexts";
    /// Supplementary vocabulary metadata
    pub const VOCABULARY_METADATA: &str = "vocabulary-metadata";
    /// Vocabulary cache index
    pub const CACHE_VOCABULARIES: &str = "cache-vocabularies";
    /// Diagrams of the application context
    pub const DIAGRAMS: &str = "diagrams";
    /// Diagram collaborators
    pub const USERS: &str = "users";
    /// Element configuration
    pub const ELEMENTS_CONFIG: &str = "elements-config";
    /// Link configuration
    pub const LINKS_CONFIG: &str = "links-config";
    /// Terms of one vocabulary
    pub const TERMS: &str = "terms";
    /// Restrictions of one vocabulary
    pub const RESTRICTIONS: &str = "restrictions";
    /// Terms outside the workspace vocabularies
    pub const READ_ONLY_TERMS: &str = "read-only-terms";
    /// Element upsert
    pub const UPSERT_ELEMENTS: &str = "upsert-elements";
    /// Link insertion
    pub const INSERT_LINKS: &str = "insert-links";
    /// Element removal
    pub const REMOVE_ELEMENT: &str = "remove-element";
    /// Diagram deletion
    pub const DELETE_DIAGRAM: &str = "delete-diagram";
}

const MARKER: &str = "# graphsync:";

/// Kind marker of a generated query, if present
#[must_use]
pub fn query_kind(query: &str) -> Option<&str> {
    query
        .lines()
        .next()
        .and_then(|line| line.trim().strip_prefix(MARKER))
        .map(str::trim)
}

/// Location of one vocabulary's terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyScope {
    /// Graph context
    pub graph: Iri,
    /// Glossary
    pub glossary: Iri,
    /// Vocabulary
    pub vocabulary: Iri,
}

/// Builds every query the engine issues
pub trait QueryBuilder: Send + Sync {
    /// Vocabularies (with glossary, title, change context) in `contexts`
    fn vocabulary_contexts(&self, contexts: &[Iri]) -> String;
    /// Namespace and description per glossary
    fn vocabulary_metadata(&self, glossaries: &[Iri]) -> String;
    /// Vocabulary → diagram index of the cache context
    fn cache_vocabularies(&self, cache_context: &Iri) -> String;
    /// Diagrams
    fn diagrams(&self) -> String;
    /// Users by collaborator identifier
    fn users(&self, ids: &[String]) -> String;
    /// Element configuration
    fn elements_config(&self) -> String;
    /// Link configuration
    fn links_config(&self) -> String;
    /// Terms in scope
    fn terms(&self, scope: &VocabularyScope) -> String;
    /// Restrictions of terms in scope
    fn restrictions(&self, scope: &VocabularyScope) -> String;
    /// Terms by IRI, wherever they live
    fn read_only_terms(&self, terms: &[Iri]) -> String;
    /// Replace the stored configuration of `elements`
    fn upsert_elements(&self, elements: &[&Element]) -> String;
    /// Replace the stored configuration of `links`
    fn insert_links(&self, links: &[&Link]) -> String;
    /// Remove an element's configuration
    fn remove_element(&self, term: &Iri) -> String;
    /// Delete a diagram
    fn delete_diagram(&self, diagram: &Diagram) -> String;
}

const PREFIXES: &str = "\
PREFIX owl: <http://www.w3.org/2002/07/owl#>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dcterms: <http://purl.org/dc/terms/>
PREFIX vann: <http://purl.org/vocab/vann/>
PREFIX a-popis-dat-pojem: <http://onto.fel.cvut.cz/ontologies/slovník/agendový/popis-dat/pojem/>
PREFIX gs: <https://w3id.org/graphsync/>
";

const CHANGE_CONTEXT: &str =
    "https://slovník.gov.cz/datový/pracovní-prostor/pojem/má-kontext-sledování-změn";

fn iri_values(iris: &[Iri]) -> String {
    iris.iter()
        .map(|iri| format!("<{iri}>"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn literal(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"")
}

/// Default SPARQL text builder
#[derive(Debug, Clone)]
pub struct SparqlQueryBuilder {
    application_context: Iri,
}

impl SparqlQueryBuilder {
    /// Create a builder writing to `application_context`
    #[must_use]
    pub fn new(application_context: Iri) -> Self {
        Self {
            application_context,
        }
    }

    fn header(kind: &str) -> String {
        format!("{MARKER}{kind}\n{PREFIXES}")
    }

    fn element_node(&self, term: &Iri) -> String {
        format!(
            "<{}/element/{}>",
            self.application_context.as_str().trim_end_matches('/'),
            urlencoding::encode(term.as_str())
        )
    }

    fn state_node(&self, term: &Iri, diagram: &str) -> String {
        format!(
            "<{}/element/{}/state/{}>",
            self.application_context.as_str().trim_end_matches('/'),
            urlencoding::encode(term.as_str()),
            urlencoding::encode(diagram)
        )
    }

    fn link_node(&self, link: &Link) -> String {
        format!(
            "<{}/link/{}>",
            self.application_context.as_str().trim_end_matches('/'),
            urlencoding::encode(link.id.as_str())
        )
    }
}

impl QueryBuilder for SparqlQueryBuilder {
    fn vocabulary_contexts(&self, contexts: &[Iri]) -> String {
        format!(
            "{header}SELECT ?contextIRI ?scheme ?vocabLabel ?vocabIRI ?changeContext WHERE {{
  GRAPH ?contextIRI {{
    ?vocabIRI a a-popis-dat-pojem:slovník ;
      a-popis-dat-pojem:má-glosář ?scheme ;
      dcterms:title ?vocabLabel .
    OPTIONAL {{ ?vocabIRI <{CHANGE_CONTEXT}> ?changeContext . }}
  }}
  VALUES ?contextIRI {{ {contexts} }}
}}",
            header = Self::header(kinds::VOCABULARY_CONTEXTS),
            contexts = iri_values(contexts),
        )
    }

    fn vocabulary_metadata(&self, glossaries: &[Iri]) -> String {
        format!(
            "{header}SELECT ?scheme ?namespace ?description WHERE {{
  ?vocabulary a-popis-dat-pojem:má-glosář ?scheme .
  OPTIONAL {{ ?vocabulary vann:preferredNamespaceUri ?namespace . }}
  OPTIONAL {{ ?vocabulary dcterms:description ?description . }}
  VALUES ?scheme {{ {glossaries} }}
}}",
            header = Self::header(kinds::VOCABULARY_METADATA),
            glossaries = iri_values(glossaries),
        )
    }

    fn cache_vocabularies(&self, cache_context: &Iri) -> String {
        format!(
            "{header}SELECT ?vocabulary ?label ?diagram WHERE {{
  GRAPH <{cache_context}> {{
    ?vocabulary a a-popis-dat-pojem:slovník .
    OPTIONAL {{ ?vocabulary dcterms:title ?label . }}
    OPTIONAL {{ ?diagram gs:references-vocabulary ?vocabulary . }}
  }}
}}",
            header = Self::header(kinds::CACHE_VOCABULARIES),
        )
    }

    fn diagrams(&self) -> String {
        format!(
            "{header}SELECT ?diagram ?id ?name ?collaborator WHERE {{
  GRAPH <{app}> {{
    ?diagram a gs:diagram ;
      gs:id ?id ;
      gs:name ?name .
    OPTIONAL {{ ?diagram gs:collaborator ?collaborator . }}
  }}
}}",
            header = Self::header(kinds::DIAGRAMS),
            app = self.application_context,
        )
    }

    fn users(&self, ids: &[String]) -> String {
        format!(
            "{header}SELECT ?id ?givenName ?familyName WHERE {{
  GRAPH <{app}> {{
    ?user a gs:user ;
      gs:id ?id .
    OPTIONAL {{ ?user gs:given-name ?givenName . }}
    OPTIONAL {{ ?user gs:family-name ?familyName . }}
  }}
  VALUES ?id {{ {ids} }}
}}",
            header = Self::header(kinds::USERS),
            app = self.application_context,
            ids = ids.iter().map(|id| literal(id)).collect::<Vec<_>>().join(" "),
        )
    }

    fn elements_config(&self) -> String {
        format!(
            "{header}SELECT ?term ?vocabulary ?diagramId ?hidden WHERE {{
  GRAPH <{app}> {{
    ?element a gs:element ;
      gs:term ?term .
    OPTIONAL {{ ?element gs:vocabulary ?vocabulary . }}
    OPTIONAL {{
      ?element gs:diagram-state ?state .
      ?state gs:diagram-id ?diagramId ;
        gs:hidden ?hidden .
    }}
  }}
}}",
            header = Self::header(kinds::ELEMENTS_CONFIG),
            app = self.application_context,
        )
    }

    fn links_config(&self) -> String {
        format!(
            "{header}SELECT ?id ?source ?target ?iri ?active WHERE {{
  GRAPH <{app}> {{
    ?link a gs:link ;
      gs:id ?id ;
      gs:source ?source ;
      gs:target ?target ;
      gs:type ?iri .
    OPTIONAL {{ ?link gs:active ?active . }}
  }}
}}",
            header = Self::header(kinds::LINKS_CONFIG),
            app = self.application_context,
        )
    }

    fn terms(&self, scope: &VocabularyScope) -> String {
        format!(
            "{header}SELECT ?term ?label WHERE {{
  GRAPH <{graph}> {{
    ?term skos:inScheme <{glossary}> .
    OPTIONAL {{ ?term skos:prefLabel ?label . }}
  }}
}}",
            header = Self::header(kinds::TERMS),
            graph = scope.graph,
            glossary = scope.glossary,
        )
    }

    fn restrictions(&self, scope: &VocabularyScope) -> String {
        format!(
            "{header}SELECT ?term ?onProperty ?target WHERE {{
  GRAPH <{graph}> {{
    ?term skos:inScheme <{glossary}> ;
      rdfs:subClassOf ?restriction .
    ?restriction a owl:Restriction ;
      owl:onProperty ?onProperty ;
      owl:someValuesFrom|owl:allValuesFrom ?target .
    FILTER(isIRI(?target))
  }}
}}",
            header = Self::header(kinds::RESTRICTIONS),
            graph = scope.graph,
            glossary = scope.glossary,
        )
    }

    fn read_only_terms(&self, terms: &[Iri]) -> String {
        format!(
            "{header}SELECT ?term ?vocabulary ?label ?onProperty ?target WHERE {{
  ?term skos:inScheme ?scheme .
  OPTIONAL {{ ?vocabulary a-popis-dat-pojem:má-glosář ?scheme . }}
  OPTIONAL {{ ?term skos:prefLabel ?label . }}
  OPTIONAL {{
    ?term rdfs:subClassOf ?restriction .
    ?restriction a owl:Restriction ;
      owl:onProperty ?onProperty ;
      owl:someValuesFrom|owl:allValuesFrom ?target .
    FILTER(isIRI(?target))
  }}
  VALUES ?term {{ {terms} }}
}}",
            header = Self::header(kinds::READ_ONLY_TERMS),
            terms = iri_values(terms),
        )
    }

    fn upsert_elements(&self, elements: &[&Element]) -> String {
        let terms: Vec<Iri> = elements.iter().map(|e| e.term.clone()).collect();
        let mut data = String::new();
        for element in elements {
            let node = self.element_node(&element.term);
            data.push_str(&format!("    {node} a gs:element ; gs:term <{}> .\n", element.term));
            if let Some(vocabulary) = &element.vocabulary {
                data.push_str(&format!("    {node} gs:vocabulary <{vocabulary}> .\n"));
            }
            for (diagram, hidden) in &element.hidden {
                let state = self.state_node(&element.term, diagram.as_str());
                data.push_str(&format!(
                    "    {node} gs:diagram-state {state} .\n    {state} gs:diagram-id {} ; gs:hidden {hidden} .\n",
                    literal(diagram.as_str())
                ));
            }
        }
        format!(
            "{header}DELETE {{ GRAPH <{app}> {{ ?element ?p ?o . ?state ?sp ?so . }} }}
WHERE {{
  GRAPH <{app}> {{
    ?element gs:term ?term ; ?p ?o .
    OPTIONAL {{ ?element gs:diagram-state ?state . ?state ?sp ?so . }}
  }}
  VALUES ?term {{ {terms} }}
}} ;
INSERT DATA {{
  GRAPH <{app}> {{
{data}  }}
}}",
            header = Self::header(kinds::UPSERT_ELEMENTS),
            app = self.application_context,
            terms = iri_values(&terms),
        )
    }

    fn insert_links(&self, links: &[&Link]) -> String {
        let mut nodes = Vec::with_capacity(links.len());
        let mut data = String::new();
        for link in links {
            let node = self.link_node(link);
            data.push_str(&format!(
                "    {node} a gs:link ; gs:id {} ; gs:source <{}> ; gs:target <{}> ; gs:type <{}> ; gs:active {} .\n",
                literal(link.id.as_str()),
                link.source,
                link.target,
                link.iri,
                link.active
            ));
            nodes.push(node);
        }
        format!(
            "{header}DELETE {{ GRAPH <{app}> {{ ?link ?p ?o . }} }}
WHERE {{
  GRAPH <{app}> {{ ?link ?p ?o . }}
  VALUES ?link {{ {nodes} }}
}} ;
INSERT DATA {{
  GRAPH <{app}> {{
{data}  }}
}}",
            header = Self::header(kinds::INSERT_LINKS),
            app = self.application_context,
            nodes = nodes.join(" "),
        )
    }

    fn remove_element(&self, term: &Iri) -> String {
        format!(
            "{header}DELETE {{ GRAPH <{app}> {{ ?element ?p ?o . ?state ?sp ?so . }} }}
WHERE {{
  GRAPH <{app}> {{
    ?element gs:term <{term}> ; ?p ?o .
    OPTIONAL {{ ?element gs:diagram-state ?state . ?state ?sp ?so . }}
  }}
}}",
            header = Self::header(kinds::REMOVE_ELEMENT),
            app = self.application_context,
        )
    }

    fn delete_diagram(&self, diagram: &Diagram) -> String {
        format!(
            "{header}DELETE WHERE {{ GRAPH <{app}> {{ <{iri}> ?p ?o . }} }} ;
DROP SILENT GRAPH <{iri}>",
            header = Self::header(kinds::DELETE_DIAGRAM),
            app = self.application_context,
            iri = diagram.iri,
        )
    }
}
