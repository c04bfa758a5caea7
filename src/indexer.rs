//! Column Indexer
//!
//! Resolves each catalog field of a section to a token position in its header
//! line. Tokens are visited left to right; each one is claimed by the first
//! field pattern that matches it and has not claimed a column yet. Fields
//! left without a column are absent from every record of the section.
//!
//! Data tokens are located from the right edge of the line: a column keeps its
//! distance from the last header token. Header and data lines of a sysstat
//! section have the same width, so this agrees with plain left indexing, and
//! it still lines up when a header carries extra leading tokens.

use crate::catalog::FieldPattern;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    width: usize,
    columns: Vec<(&'static str, Option<usize>)>,
}

impl ColumnIndex {
    pub fn build(header: &str, fields: &[FieldPattern]) -> Self {
        let tokens: Vec<&str> = header.split_whitespace().collect();
        let mut positions: Vec<Option<usize>> = vec![None; fields.len()];

        for (position, token) in tokens.iter().enumerate() {
            let claim = fields
                .iter()
                .enumerate()
                .find(|(i, field)| positions[*i].is_none() && field.pattern.is_match(token));
            if let Some((i, _)) = claim {
                positions[i] = Some(position);
            }
        }

        Self {
            width: tokens.len(),
            columns: fields.iter().map(|field| field.name).zip(positions).collect(),
        }
    }

    /// Token count of the header line.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Header position of `field`, `None` if unresolved or unknown.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, position)| *position)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, Option<usize>)> + '_ {
        self.columns.iter().copied()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter(|(_, position)| position.is_none())
            .map(|(name, _)| *name)
    }

    /// Where the column at header `position` sits in a line of `line_width`
    /// tokens. `None` when the line is too short to hold it.
    pub fn locate(&self, position: usize, line_width: usize) -> Option<usize> {
        line_width.checked_sub(self.width.checked_sub(position)?)
    }

    /// Whether both indexes put every field at the same distance from the
    /// end of the line.
    pub fn same_layout(&self, other: &ColumnIndex) -> bool {
        let from_end = |index: &ColumnIndex| -> Vec<(&'static str, Option<usize>)> {
            index
                .columns
                .iter()
                .map(|(name, position)| (*name, position.map(|p| index.width - p)))
                .collect()
        };
        from_end(self) == from_end(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, SectionKind};

    fn cpu_fields() -> Vec<FieldPattern> {
        Catalog::standard().section(SectionKind::Cpu).unwrap().fields.clone()
    }

    #[test]
    fn test_resolves_cpu_header() {
        let index = ColumnIndex::build(
            "00:00:01        CPU     %user     %nice   %system   %iowait    %steal     %idle",
            &cpu_fields(),
        );
        assert_eq!(index.width(), 8);
        assert_eq!(index.position("usr"), Some(2));
        assert_eq!(index.position("nice"), Some(3));
        assert_eq!(index.position("sys"), Some(4));
        assert_eq!(index.position("iowait"), Some(5));
        assert_eq!(index.position("idle"), Some(7));
        assert_eq!(index.unresolved().count(), 0);
    }

    #[test]
    fn test_first_claim_wins() {
        // `%nice` must not be re-claimed by the later `%gnice` column
        let index = ColumnIndex::build(
            "00:00:01 CPU %usr %nice %sys %iowait %steal %irq %soft %guest %gnice %idle",
            &cpu_fields(),
        );
        assert_eq!(index.position("nice"), Some(3));
        assert_eq!(index.position("idle"), Some(11));
    }

    #[test]
    fn test_unresolved_fields() {
        let index = ColumnIndex::build("00:00:01 CPU %usr %nice %sys %idle", &cpu_fields());
        assert_eq!(index.position("iowait"), None);
        assert_eq!(index.unresolved().collect::<Vec<_>>(), vec!["iowait"]);
        assert_eq!(index.position("bogus"), None);
    }

    #[test]
    fn test_locate_from_right_edge() {
        let index = ColumnIndex::build("Linux  00:00:01 CPU %usr %nice %sys %iowait %idle", &cpu_fields());
        let usr = index.position("usr").unwrap();
        let idle = index.position("idle").unwrap();
        assert_eq!(usr, 3);

        // "00:05:00 all 1.00 0.00 0.50 0.10 98.40"
        assert_eq!(index.locate(usr, 7), Some(2));
        assert_eq!(index.locate(idle, 7), Some(6));
        // equal widths behave like left indexing
        assert_eq!(index.locate(usr, 8), Some(3));
        assert_eq!(index.locate(usr, 4), None);
    }

    #[test]
    fn test_same_layout() {
        let fields = cpu_fields();
        let first = ColumnIndex::build("Linux 00:00:01 CPU %usr %nice %sys %iowait %idle", &fields);
        let repeat = ColumnIndex::build("08:30:01 CPU %usr %nice %sys %iowait %idle", &fields);
        let twelve_hour = ColumnIndex::build("08:30:01 AM CPU %usr %nice %sys %iowait %idle", &fields);
        let changed = ColumnIndex::build("08:30:01 CPU %usr %nice %sys %iowait %steal %idle", &fields);

        assert!(first.same_layout(&repeat));
        assert!(first.same_layout(&twelve_hour));
        assert!(!first.same_layout(&changed));
    }
}
