//! Toolkit-independent model behind the design components table.

use crossbeam::channel::Receiver;

use crate::design::Design;
use crate::events::DesignEvent;

pub const COLUMNS: [&str; 4] = ["Name", "QComponent class", "QComponent module", "Build status"];

/// Rows are components in design order; columns are [`COLUMNS`].
///
/// Instead of polling the row count on a timer, the table listens to the design's
/// [`DesignEvent`]s and tells its view when a full reset is due.
#[derive(Debug)]
pub struct ComponentsTable {
    events: Receiver<DesignEvent>,
    row_count: usize,
}

impl ComponentsTable {
    pub fn new(design: &mut Design) -> Self {
        Self {
            events: design.subscribe(),
            row_count: design.components().len(),
        }
    }

    /// Drains pending events. Returns `true` when the view should reset itself.
    pub fn sync(&mut self, design: &Design) -> bool {
        let mut structural = false;
        for event in self.events.try_iter() {
            structural |= event.is_structural();
        }
        let count = design.components().len();
        let reset = structural || count != self.row_count;
        self.row_count = count;
        reset
    }

    /// Row count as of the last [`ComponentsTable::sync`].
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        COLUMNS.len()
    }

    #[must_use]
    pub fn header(&self, section: usize) -> Option<&'static str> {
        COLUMNS.get(section).copied()
    }

    #[must_use]
    pub fn component_at<'d>(&self, design: &'d Design, row: usize) -> Option<&'d str> {
        design
            .components()
            .get_index(row)
            .map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn cell(&self, design: &Design, row: usize, column: usize) -> Option<String> {
        let (name, component) = design.components().get_index(row)?;
        match column {
            0 => Some(name.clone()),
            1 => Some(component.class_name().to_string()),
            2 => Some(component.module_name().to_string()),
            3 => Some(component.status().to_string()),
            _ => None,
        }
    }

    /// All cells, one row per component.
    #[must_use]
    pub fn rows(&self, design: &Design) -> Vec<[String; 4]> {
        design
            .components()
            .values()
            .map(|c| {
                [
                    c.name().to_string(),
                    c.class_name().to_string(),
                    c.module_name().to_string(),
                    c.status().to_string(),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::RectanglePad;

    #[test]
    fn rows_follow_the_design() {
        let mut design = Design::new();
        let mut table = ComponentsTable::new(&mut design);
        assert_eq!(table.row_count(), 0);
        assert!(!table.sync(&design));

        design
            .add_component(Box::new(RectanglePad::new("pad_a", [])))
            .unwrap();
        assert!(table.sync(&design));
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.component_at(&design, 0), Some("pad_a"));
        assert_eq!(table.cell(&design, 0, 1).as_deref(), Some("RectanglePad"));
        assert_eq!(
            table.cell(&design, 0, 2).as_deref(),
            Some("qdesign_core::library")
        );
        assert_eq!(table.cell(&design, 0, 3).as_deref(), Some("unbuilt"));
        assert_eq!(table.cell(&design, 0, 4), None);
        assert_eq!(table.cell(&design, 1, 0), None);

        design.make_all_components();
        assert!(!table.sync(&design));
        assert_eq!(table.cell(&design, 0, 3).as_deref(), Some("good"));
    }

    #[test]
    fn rename_triggers_reset_without_count_change() {
        let mut design = Design::new();
        design
            .add_component(Box::new(RectanglePad::new("pad_a", [])))
            .unwrap();
        let mut table = ComponentsTable::new(&mut design);

        design.rename_component("pad_a", "pad_b");
        assert!(table.sync(&design));
        assert_eq!(table.rows(&design)[0][0], "pad_b");
    }

    #[test]
    fn headers() {
        let mut design = Design::new();
        let table = ComponentsTable::new(&mut design);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.header(0), Some("Name"));
        assert_eq!(table.header(3), Some("Build status"));
        assert_eq!(table.header(4), None);
    }
}
