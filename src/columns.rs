use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Field names the expansion depends on, whatever the source document calls them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Activity,
    StartDate,
    EndDate,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 3] = [
        CanonicalColumn::Activity,
        CanonicalColumn::StartDate,
        CanonicalColumn::EndDate,
    ];

    /// Header written into normalized tables and exports.
    pub fn header(self) -> &'static str {
        match self {
            CanonicalColumn::Activity => "Atividade",
            CanonicalColumn::StartDate => "Data de Inicio",
            CanonicalColumn::EndDate => "Data de Termino",
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    activity: Vec<String>,
    start_date: Vec<String>,
    end_date: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self::new(
            ["ITEM", "Nome da Tarefa", "Nome da Atividade", "Atividade", "Tarefa"],
            [
                "Início",
                "INÍCIO",
                "Data de Inicio",
                "Data Inicial",
                "Data a ser Iniciada",
            ],
            [
                "Término",
                "TÉRMINO",
                "Data de Termino",
                "Data Final",
                "Data a ser Concluida",
                "Data Conclusao",
            ],
        )
    }
}

impl ColumnAliases {
    pub fn new<A, S, E>(activity: A, start_date: S, end_date: E) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            activity: activity.into_iter().map(Into::into).collect(),
            start_date: start_date.into_iter().map(Into::into).collect(),
            end_date: end_date.into_iter().map(Into::into).collect(),
        }
    }

    /// Aliases for a canonical column, in priority order.
    pub fn aliases(&self, column: CanonicalColumn) -> &[String] {
        match column {
            CanonicalColumn::Activity => &self.activity,
            CanonicalColumn::StartDate => &self.start_date,
            CanonicalColumn::EndDate => &self.end_date,
        }
    }

    /// Rename headers to their canonical names.
    ///
    /// A header that already equals the canonical name keeps it. Otherwise the
    /// first alias (in alias-list order) present among the headers is renamed;
    /// any other header aliasing the same canonical column passes through
    /// unchanged, so a canonical name never appears twice. Applying this to
    /// its own output returns the same headers.
    pub fn normalize_headers<S: AsRef<str>>(&self, headers: &[S]) -> Vec<String> {
        let mut renamed: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();

        for column in CanonicalColumn::ALL {
            let canonical = column.header();
            if renamed.iter().any(|h| h.trim() == canonical) {
                self.log_shadowed(column, &renamed, None);
                continue;
            }

            let winner = self.aliases(column).iter().find_map(|alias| {
                renamed
                    .iter()
                    .position(|h| h.trim() == alias.as_str())
            });

            if let Some(idx) = winner {
                debug!(from = %renamed[idx], to = canonical, "renaming column");
                self.log_shadowed(column, &renamed, Some(idx));
                renamed[idx] = canonical.to_string();
            }
        }

        renamed
    }

    /// Canonical columns with no header after normalization.
    pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<CanonicalColumn> {
        let present: HashSet<&str> = headers.iter().map(|h| h.as_ref().trim()).collect();
        CanonicalColumn::ALL
            .into_iter()
            .filter(|column| !present.contains(column.header()))
            .collect()
    }

    /// Position of each canonical column, if all three are present.
    pub fn locate<S: AsRef<str>>(headers: &[S]) -> Option<[usize; 3]> {
        let find = |column: CanonicalColumn| {
            headers
                .iter()
                .position(|h| h.as_ref().trim() == column.header())
        };
        Some([
            find(CanonicalColumn::Activity)?,
            find(CanonicalColumn::StartDate)?,
            find(CanonicalColumn::EndDate)?,
        ])
    }

    fn log_shadowed(&self, column: CanonicalColumn, headers: &[String], winner: Option<usize>) {
        for (idx, header) in headers.iter().enumerate() {
            if Some(idx) == winner || header.trim() == column.header() {
                continue;
            }
            if self.aliases(column).iter().any(|a| a == header.trim()) {
                warn!(
                    column = %column,
                    header = %header,
                    "duplicate alias column left unrenamed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_known_aliases_and_passes_others_through() {
        let aliases = ColumnAliases::default();
        let headers = ["Tarefa", "Início", "Término", "Responsável"];
        let renamed = aliases.normalize_headers(&headers);
        assert_eq!(
            renamed,
            vec!["Atividade", "Data de Inicio", "Data de Termino", "Responsável"]
        );
    }

    #[test]
    fn alias_priority_follows_alias_list_order() {
        let aliases = ColumnAliases::default();
        // "Nome da Tarefa" precedes "Tarefa" in the alias list.
        let renamed = aliases.normalize_headers(&["Tarefa", "Nome da Tarefa"]);
        assert_eq!(renamed, vec!["Tarefa", "Atividade"]);
    }

    #[test]
    fn existing_canonical_header_wins_over_aliases() {
        let aliases = ColumnAliases::default();
        let renamed = aliases.normalize_headers(&["ITEM", "Atividade"]);
        assert_eq!(renamed, vec!["ITEM", "Atividade"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let aliases = ColumnAliases::default();
        let headers = ["Nome da Atividade", "Tarefa", "INÍCIO", "Data Final", "Obs"];
        let once = aliases.normalize_headers(&headers);
        let twice = aliases.normalize_headers(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn matching_is_case_and_accent_sensitive() {
        let aliases = ColumnAliases::default();
        let renamed = aliases.normalize_headers(&["tarefa", "Inicio"]);
        assert_eq!(renamed, vec!["tarefa", "Inicio"]);
    }

    #[test]
    fn reports_missing_canonical_columns() {
        let missing = ColumnAliases::missing_columns(&["Atividade", "Data de Inicio"]);
        assert_eq!(missing, vec![CanonicalColumn::EndDate]);
        assert!(ColumnAliases::locate(&["Atividade", "Data de Inicio"]).is_none());
        assert_eq!(
            ColumnAliases::locate(&["x", "Data de Termino", "Atividade", "Data de Inicio"]),
            Some([2, 3, 1])
        );
    }
}
