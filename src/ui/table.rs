use tabled::{settings::Style, Table, Tabled};

use crate::storage::GraphSummary;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub metric: String,
    #[tabled(rename = "Rows")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, usize)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, &value.to_string());
    }
    builder.build()
}

/// One stored graph in `belstore list`
#[derive(Tabled)]
pub struct GraphRow {
    #[tabled(rename = "Id")]
    pub id: i64,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Edges")]
    pub edges: usize,
    #[tabled(rename = "Created")]
    pub created: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&GraphSummary> for GraphRow {
    fn from(summary: &GraphSummary) -> Self {
        Self {
            id: summary.id,
            label: summary.label.clone(),
            edges: summary.edges,
            created: summary.created.clone(),
            description: summary.description.clone().unwrap_or_default(),
        }
    }
}

pub fn graphs_table(summaries: &[GraphSummary]) -> String {
    let rows: Vec<GraphRow> = summaries.iter().map(GraphRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table_lists_rows() {
        let rendered = stats_table(&[("nodes", 2), ("edges", 5)]);
        assert!(rendered.contains("nodes"));
        assert!(rendered.contains('5'));
        assert!(stats_table(&[]).is_empty());
    }

    #[test]
    fn test_graphs_table() {
        let rendered = graphs_table(&[GraphSummary {
            id: 1,
            label: "tg".to_string(),
            description: None,
            created: "2024-01-01T00:00:00+00:00".to_string(),
            edges: 3,
        }]);
        assert!(rendered.contains("tg"));
        assert!(rendered.contains("Label"));
    }
}
