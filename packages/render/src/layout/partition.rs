use mediakit_store::{ColumnAssignment, LayoutType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCount {
    Fixed(i32),
    /// One auto-flowing cell list (grid)
    AutoFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    /// Column 1 is the main column, the rest is aside
    MainColumn,
    /// Single full-bleed column
    Hero,
}

/// How a layout type splits into columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub layout: EffectiveLayout,
    pub columns: ColumnCount,
    pub emphasis: Emphasis,
}

/// Layout type after the unknown-to-full-width fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveLayout {
    FullWidth,
    TwoColumn,
    ThreeColumn,
    MainAside,
    Grid,
    Hero,
}

impl EffectiveLayout {
    pub fn layout_type(self) -> LayoutType {
        match self {
            EffectiveLayout::FullWidth => LayoutType::FullWidth,
            EffectiveLayout::TwoColumn => LayoutType::TwoColumn,
            EffectiveLayout::ThreeColumn => LayoutType::ThreeColumn,
            EffectiveLayout::MainAside => LayoutType::MainAside,
            EffectiveLayout::Grid => LayoutType::Grid,
            EffectiveLayout::Hero => LayoutType::Hero,
        }
    }
}

/// Component ids placed in one column, in assignment order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup<'a> {
    pub column: i32,
    pub component_ids: Vec<&'a str>,
}

impl Partition {
    /// Partition for a layout type; unknown types get the full-width one
    pub fn for_layout(layout: &LayoutType) -> Self {
        let (layout, columns, emphasis) = match layout {
            LayoutType::FullWidth | LayoutType::Unknown(_) => {
                (EffectiveLayout::FullWidth, ColumnCount::Fixed(1), Emphasis::None)
            }
            LayoutType::TwoColumn => (EffectiveLayout::TwoColumn, ColumnCount::Fixed(2), Emphasis::None),
            LayoutType::ThreeColumn => {
                (EffectiveLayout::ThreeColumn, ColumnCount::Fixed(3), Emphasis::None)
            }
            LayoutType::MainAside => {
                (EffectiveLayout::MainAside, ColumnCount::Fixed(2), Emphasis::MainColumn)
            }
            LayoutType::Grid => (EffectiveLayout::Grid, ColumnCount::AutoFlow, Emphasis::None),
            LayoutType::Hero => (EffectiveLayout::Hero, ColumnCount::Fixed(1), Emphasis::Hero),
        };
        Self {
            layout,
            columns,
            emphasis,
        }
    }

    /// Number of column containers to render
    pub fn container_count(&self) -> i32 {
        match self.columns {
            ColumnCount::Fixed(n) => n,
            ColumnCount::AutoFlow => 1,
        }
    }

    /// Map an assigned column onto a rendered container (1-based)
    pub fn clamp(&self, column: i32) -> i32 {
        column.clamp(1, self.container_count())
    }

    /// Group assignments by container, clamping out-of-range columns
    pub fn group<'a>(&self, assignments: &'a [ColumnAssignment]) -> Vec<ColumnGroup<'a>> {
        let mut groups: Vec<ColumnGroup<'a>> = (1..=self.container_count())
            .map(|column| ColumnGroup {
                column,
                component_ids: Vec::new(),
            })
            .collect();

        for assignment in assignments {
            let column = self.clamp(assignment.column);
            if column != assignment.column && self.columns != ColumnCount::AutoFlow {
                tracing::debug!(
                    component_id = %assignment.component_id,
                    from = assignment.column,
                    to = column,
                    "clamped column assignment"
                );
            }
            groups[(column - 1) as usize]
                .component_ids
                .push(assignment.component_id.as_str());
        }

        groups
    }

    pub fn column_label(&self, column: i32) -> String {
        match (self.emphasis, self.columns) {
            (Emphasis::MainColumn, _) if column == 1 => "Main Content".to_string(),
            (Emphasis::MainColumn, _) => "Sidebar".to_string(),
            (_, ColumnCount::AutoFlow) => "Grid".to_string(),
            (_, ColumnCount::Fixed(1)) => "Content".to_string(),
            _ => format!("Column {}", column),
        }
    }

    /// Modifier class for a column container
    pub fn column_modifier(&self, column: i32) -> String {
        match (self.emphasis, self.columns) {
            (Emphasis::MainColumn, _) if column == 1 => "main".to_string(),
            (Emphasis::MainColumn, _) => "aside".to_string(),
            (Emphasis::Hero, _) => "hero".to_string(),
            (_, ColumnCount::AutoFlow) => "auto".to_string(),
            _ => column.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignments(pairs: &[(&str, i32)]) -> Vec<ColumnAssignment> {
        pairs
            .iter()
            .map(|(id, column)| ColumnAssignment::new(*id, *column))
            .collect()
    }

    #[test]
    fn test_column_counts() {
        assert_eq!(Partition::for_layout(&LayoutType::FullWidth).container_count(), 1);
        assert_eq!(Partition::for_layout(&LayoutType::TwoColumn).container_count(), 2);
        assert_eq!(Partition::for_layout(&LayoutType::ThreeColumn).container_count(), 3);
        assert_eq!(Partition::for_layout(&LayoutType::MainAside).container_count(), 2);
        assert_eq!(Partition::for_layout(&LayoutType::Hero).container_count(), 1);
        assert_eq!(
            Partition::for_layout(&LayoutType::Grid).columns,
            ColumnCount::AutoFlow
        );
    }

    #[test]
    fn test_unknown_layout_is_full_width() {
        assert_eq!(
            Partition::for_layout(&LayoutType::Unknown("carousel".into())),
            Partition::for_layout(&LayoutType::FullWidth)
        );
    }

    #[test]
    fn test_group_clamps_and_keeps_order() {
        let partition = Partition::for_layout(&LayoutType::TwoColumn);
        let list = assignments(&[("a", 2), ("b", 9), ("c", 0), ("d", 1)]);
        let groups = partition.group(&list);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].component_ids, vec!["c", "d"]);
        assert_eq!(groups[1].component_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_grid_flows_in_assignment_order() {
        let partition = Partition::for_layout(&LayoutType::Grid);
        let list = assignments(&[("a", 3), ("b", 1), ("c", 2)]);
        let groups = partition.group(&list);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].component_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_main_aside_labels() {
        let partition = Partition::for_layout(&LayoutType::MainAside);
        assert_eq!(partition.column_label(1), "Main Content");
        assert_eq!(partition.column_label(2), "Sidebar");
        assert_eq!(partition.column_modifier(2), "aside");
    }
}
