use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{GraphData, entity_color};
use crate::error::GraphError;
use crate::telemetry::metrics::GRAPH_ENTITIES;

pub const ARTIFACT_FILE: &str = "graph.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    pub status: String,
    pub file_path: String,
}

#[derive(Debug, Serialize)]
struct NodeLinkDocument<'a> {
    heading: String,
    case_id: &'a str,
    nodes: Vec<Node<'a>>,
    edges: Vec<Edge<'a>>,
}

#[derive(Debug, Serialize)]
struct Node<'a> {
    id: &'a str,
    label: String,
    title: String,
    color: &'static str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct Edge<'a> {
    from: &'a str,
    to: &'a str,
    title: &'a str,
    label: &'a str,
}

/// `<evidence_dir>/<case_id>/graph.json`, rejecting ids that would escape `evidence_dir`.
pub fn artifact_path(evidence_dir: &Path, case_id: &str) -> Result<PathBuf, GraphError> {
    let unsafe_id = case_id.trim().is_empty()
        || case_id.contains(['/', '\\'])
        || case_id.contains("..");
    if unsafe_id {
        return Err(GraphError::InvalidCaseId(case_id.to_string()));
    }
    Ok(evidence_dir.join(case_id).join(ARTIFACT_FILE))
}

#[tracing::instrument(
    name = "graph export",
    skip(data, evidence_dir),
    fields(
        case.id = %data.case_id,
        graph.entities = data.entities.len(),
        graph.relationships = data.relationships.len(),
    )
)]
pub async fn export_graph(data: &GraphData, evidence_dir: &Path) -> Result<GraphExport, GraphError> {
    let path = artifact_path(evidence_dir, &data.case_id)?;

    let document = NodeLinkDocument {
        heading: format!("SPECTRE Intelligence Graph: {}", data.case_name),
        case_id: &data.case_id,
        nodes: data
            .entities
            .iter()
            .map(|e| Node {
                id: &e.id,
                label: e.label(),
                title: e.tooltip(),
                color: entity_color(&e.kind),
                kind: &e.kind,
            })
            .collect(),
        edges: data
            .relationships
            .iter()
            .map(|r| Edge {
                from: &r.from_entity_id,
                to: &r.to_entity_id,
                title: r.title(),
                label: r.label(),
            })
            .collect(),
    };
    let bytes = serde_json::to_vec_pretty(&document)?;

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&path, bytes).await?;

    GRAPH_ENTITIES.record(data.entities.len() as f64, &[]);
    tracing::info!(path = %path.display(), "Case graph exported");

    Ok(GraphExport {
        status: "success".to_string(),
        file_path: path.display().to_string(),
    })
}
