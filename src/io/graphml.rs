//! GraphML codec: reads and writes the public-standard subset this crate
//! needs — `<graph edgedefault>`, `<node>`/`<edge>`, and `<data>` resolved
//! through `<key attr.name>` declarations. Parsing is event-driven via
//! `quick_xml`, the same family of streaming XML reader the pack reaches
//! for whenever a corpus repo needs a non-trivial text format it can't get
//! from `serde` alone.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use quick_xml::Writer;
use thiserror::Error;

use crate::graph::Graph;

#[derive(Debug, Error)]
pub enum GraphmlError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed GraphML in `{path}`: {reason}")]
    Malformed { path: String, reason: String },

    #[error("xml parse error in `{path}`: {source}")]
    Xml {
        path: String,
        #[source]
        source: quick_xml::Error,
    },
}

/// A parsed GraphML document, retaining the raw (single-direction) edge
/// list alongside the bidirectional [`Graph`] so writing can round-trip the
/// file's own edge count instead of the doubled view an undirected `Graph`
/// exposes internally.
#[derive(Debug, Clone)]
pub struct GraphmlDocument {
    pub directed: bool,
    pub graph: Graph<String, String>,
    pub node_order: Vec<String>,
    pub node_colors: HashMap<String, String>,
    pub raw_edges: Vec<(String, String, Option<String>)>,
}

enum Context {
    None,
    Node(String),
    Edge(String, String, Option<String>),
}

fn attr_value(tag: &BytesStart, name: &[u8]) -> Option<String> {
    tag.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == name {
            Some(String::from_utf8_lossy(&a.value).into_owned())
        } else {
            None
        }
    })
}

/// Read one GraphML file, resolving `<data>` elements against `node_attr`
/// (for node color) and `edge_attr` (for the edge-attribute equality
/// constraint) by their `attr.name`, not their raw `key` id.
pub fn read_graph(path: &Path, node_attr: &str, edge_attr: &str) -> Result<GraphmlDocument, GraphmlError> {
    let path_str = path.display().to_string();
    let xml = fs::read_to_string(path).map_err(|source| GraphmlError::Io {
        path: path_str.clone(),
        source,
    })?;

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(true);

    let mut key_attr_name: HashMap<String, String> = HashMap::new();
    let mut directed = true;
    let mut graph: Graph<String, String> = Graph::new(true);
    let mut node_order = Vec::new();
    let mut node_colors = HashMap::new();
    let mut raw_edges = Vec::new();
    let mut ctx = Context::None;
    let mut pending_data_key: Option<String> = None;
    let mut buf = Vec::new();

    let malformed = |reason: String| GraphmlError::Malformed {
        path: path_str.clone(),
        reason,
    };

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|source| GraphmlError::Xml {
            path: path_str.clone(),
            source,
        })?;

        match event {
            Event::Eof => break,

            Event::Start(tag) if tag.name().as_ref() == b"key" => {
                let id = attr_value(&tag, b"id").ok_or_else(|| malformed("<key> missing id".into()))?;
                if let Some(name) = attr_value(&tag, b"attr.name") {
                    key_attr_name.insert(id, name);
                }
            }
            Event::Empty(tag) if tag.name().as_ref() == b"key" => {
                let id = attr_value(&tag, b"id").ok_or_else(|| malformed("<key> missing id".into()))?;
                if let Some(name) = attr_value(&tag, b"attr.name") {
                    key_attr_name.insert(id, name);
                }
            }

            Event::Start(tag) if tag.name().as_ref() == b"graph" => {
                directed = attr_value(&tag, b"edgedefault").as_deref() != Some("undirected");
                graph = Graph::new(directed);
            }

            Event::Start(tag) if tag.name().as_ref() == b"node" => {
                let id = attr_value(&tag, b"id").ok_or_else(|| malformed("<node> missing id".into()))?;
                graph.add_node(id.clone());
                node_order.push(id.clone());
                ctx = Context::Node(id);
            }
            Event::Empty(tag) if tag.name().as_ref() == b"node" => {
                let id = attr_value(&tag, b"id").ok_or_else(|| malformed("<node> missing id".into()))?;
                graph.add_node(id.clone());
                node_order.push(id);
            }

            Event::Start(tag) if tag.name().as_ref() == b"edge" => {
                let source = attr_value(&tag, b"source").ok_or_else(|| malformed("<edge> missing source".into()))?;
                let target = attr_value(&tag, b"target").ok_or_else(|| malformed("<edge> missing target".into()))?;
                ctx = Context::Edge(source, target, None);
            }
            Event::Empty(tag) if tag.name().as_ref() == b"edge" => {
                let source = attr_value(&tag, b"source").ok_or_else(|| malformed("<edge> missing source".into()))?;
                let target = attr_value(&tag, b"target").ok_or_else(|| malformed("<edge> missing target".into()))?;
                graph.add_edge(source.clone(), target.clone(), None);
                raw_edges.push((source, target, None));
            }

            Event::Start(tag) | Event::Empty(tag) if tag.name().as_ref() == b"data" => {
                pending_data_key = attr_value(&tag, b"key");
            }

            Event::Text(text) => {
                if let Some(key) = pending_data_key.take() {
                    let attr_name = key_attr_name.get(&key).cloned().unwrap_or(key);
                    let value = text
                        .unescape()
                        .map_err(|source| GraphmlError::Xml {
                            path: path_str.clone(),
                            source,
                        })?
                        .into_owned();
                    match &mut ctx {
                        Context::Node(id) if attr_name == node_attr => {
                            node_colors.insert(id.clone(), value);
                        }
                        Context::Edge(_, _, attr_value) if attr_name == edge_attr => {
                            *attr_value = Some(value);
                        }
                        _ => {}
                    }
                }
            }

            Event::End(tag) if tag.name().as_ref() == b"node" => {
                ctx = Context::None;
            }
            Event::End(tag) if tag.name().as_ref() == b"edge" => {
                if let Context::Edge(source, target, attr) = std::mem::replace(&mut ctx, Context::None) {
                    graph.add_edge(source.clone(), target.clone(), attr.clone());
                    raw_edges.push((source, target, attr));
                }
            }

            _ => {}
        }
        buf.clear();
    }

    Ok(GraphmlDocument {
        directed,
        graph,
        node_order,
        node_colors,
        raw_edges,
    })
}

/// Write a GraphML document, substituting `colors` for the node-color
/// attribute (the solved palette values) and re-emitting the edge-attribute
/// values already recorded on `document`. Emits a `<key>` only for an
/// attribute actually used anywhere in the output, per the public
/// standard's convention.
pub fn write_graph(
    path: &Path,
    document: &GraphmlDocument,
    node_attr: &str,
    edge_attr: &str,
    colors: &HashMap<String, String>,
) -> Result<(), GraphmlError> {
    let path_str = path.display().to_string();
    let has_edge_attr = document.raw_edges.iter().any(|(_, _, a)| a.is_some());
    let has_node_attr = !colors.is_empty();

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write_decl(&mut writer)?;
    write_start(&mut writer, b"graphml", &[(b"xmlns", b"http://graphml.graphdrawing.org/xmlns")])?;

    if has_node_attr {
        write_key(&mut writer, "d_node", "node", node_attr)?;
    }
    if has_edge_attr {
        write_key(&mut writer, "d_edge", "edge", edge_attr)?;
    }

    let edgedefault: &[u8] = if document.directed { b"directed" } else { b"undirected" };
    write_start(&mut writer, b"graph", &[(b"edgedefault", edgedefault)])?;

    for id in &document.node_order {
        if let Some(color) = colors.get(id) {
            write_start(&mut writer, b"node", &[(b"id", id.as_bytes())])?;
            write_data(&mut writer, "d_node", color)?;
            write_end(&mut writer, b"node")?;
        } else {
            write_empty(&mut writer, b"node", &[(b"id", id.as_bytes())])?;
        }
    }

    for (source, target, attr) in &document.raw_edges {
        let attrs: Vec<(&[u8], &[u8])> = vec![(b"source", source.as_bytes()), (b"target", target.as_bytes())];
        if let Some(value) = attr {
            write_start(&mut writer, b"edge", &attrs)?;
            write_data(&mut writer, "d_edge", value)?;
            write_end(&mut writer, b"edge")?;
        } else {
            write_empty(&mut writer, b"edge", &attrs)?;
        }
    }

    write_end(&mut writer, b"graph")?;
    write_end(&mut writer, b"graphml")?;

    fs::write(path, writer.into_inner()).map_err(|source| GraphmlError::Io {
        path: path_str,
        source,
    })
}

fn write_decl(writer: &mut Writer<Vec<u8>>) -> Result<(), GraphmlError> {
    writer
        .write_event(Event::Decl(quick_xml::events::BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(wrap_write_err)
}

fn write_start(writer: &mut Writer<Vec<u8>>, name: &[u8], attrs: &[(&[u8], &[u8])]) -> Result<(), GraphmlError> {
    let mut tag = BytesStart::new(String::from_utf8_lossy(name).into_owned());
    for (k, v) in attrs {
        tag.push_attribute((*k, *v));
    }
    writer.write_event(Event::Start(tag)).map_err(wrap_write_err)
}

fn write_empty(writer: &mut Writer<Vec<u8>>, name: &[u8], attrs: &[(&[u8], &[u8])]) -> Result<(), GraphmlError> {
    let mut tag = BytesStart::new(String::from_utf8_lossy(name).into_owned());
    for (k, v) in attrs {
        tag.push_attribute((*k, *v));
    }
    writer.write_event(Event::Empty(tag)).map_err(wrap_write_err)
}

fn write_end(writer: &mut Writer<Vec<u8>>, name: &[u8]) -> Result<(), GraphmlError> {
    writer
        .write_event(Event::End(quick_xml::events::BytesEnd::new(String::from_utf8_lossy(name).into_owned())))
        .map_err(wrap_write_err)
}

fn write_key(writer: &mut Writer<Vec<u8>>, id: &str, target: &str, attr_name: &str) -> Result<(), GraphmlError> {
    write_empty(
        writer,
        b"key",
        &[
            (b"id", id.as_bytes()),
            (b"for", target.as_bytes()),
            (b"attr.name", attr_name.as_bytes()),
            (b"attr.type", b"string"),
        ],
    )
}

fn write_data(writer: &mut Writer<Vec<u8>>, key: &str, value: &str) -> Result<(), GraphmlError> {
    write_start(writer, b"data", &[(b"key", key.as_bytes())])?;
    writer
        .write_event(Event::Text(quick_xml::events::BytesText::new(value)))
        .map_err(wrap_write_err)?;
    write_end(writer, b"data")
}

fn wrap_write_err(source: quick_xml::Error) -> GraphmlError {
    GraphmlError::Xml {
        path: "<output>".to_string(),
        source,
    }
}
