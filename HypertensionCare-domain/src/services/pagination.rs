use std::cmp::Ordering;
use std::ops::Range;

use crate::entities::blood_pressure::BpReading;

/// Rows shown per table page
pub const ROWS_PER_PAGE: usize = 10;

/// Most page buttons shown at once
pub const PAGE_WINDOW: usize = 5;

/// Sortable columns of the readings table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    MeasurementDate,
    Systolic,
    Diastolic,
    Pulse,
    Category,
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" | "measurement_date" => Ok(SortColumn::MeasurementDate),
            "systolic" => Ok(SortColumn::Systolic),
            "diastolic" => Ok(SortColumn::Diastolic),
            "pulse" => Ok(SortColumn::Pulse),
            "category" => Ok(SortColumn::Category),
            other => Err(format!("Unknown sort column: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Arrow shown next to the active column header
    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

/// Current sort of the readings table, newest first by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::MeasurementDate,
            order: SortOrder::Desc,
        }
    }
}

impl SortState {
    /// Header click: the active column flips order, another column starts ascending
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == column {
            self.order = self.order.flipped();
        } else {
            self.column = column;
            self.order = SortOrder::Asc;
        }
    }

    fn compare(&self, a: &BpReading, b: &BpReading) -> Ordering {
        let ordering = match self.column {
            SortColumn::MeasurementDate => a.measured_at().cmp(&b.measured_at()),
            SortColumn::Systolic => a.systolic.cmp(&b.systolic),
            SortColumn::Diastolic => a.diastolic.cmp(&b.diastolic),
            SortColumn::Pulse => a.pulse.cmp(&b.pulse),
            SortColumn::Category => a.category_label().cmp(b.category_label()),
        };

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Sort readings in place; equal keys keep their relative order
    pub fn sort(&self, readings: &mut [BpReading]) {
        readings.sort_by(|a, b| self.compare(a, b));
    }
}

/// Page arithmetic for a table of `total_items` rows. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub total_items: usize,
    pub per_page: usize,
}

impl Paginator {
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            per_page: ROWS_PER_PAGE,
        }
    }

    pub fn with_per_page(total_items: usize, per_page: usize) -> Self {
        Self {
            total_items,
            per_page: per_page.max(1),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.per_page)
    }

    /// Clamp a requested page into the valid range
    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages().max(1))
    }

    /// Index range of the rows on `page`; empty past the end
    pub fn page_range(&self, page: usize) -> Range<usize> {
        let start = page.saturating_sub(1).saturating_mul(self.per_page).min(self.total_items);
        let end = start.saturating_add(self.per_page).min(self.total_items);
        start..end
    }

    /// Rows of `items` that belong on `page`
    pub fn page_items<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        let range = self.page_range(page);
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }

    /// Page numbers to offer as buttons: at most five, centred on `current` where
    /// possible and shifted to stay within the available pages
    pub fn page_window(&self, current: usize) -> Vec<usize> {
        let total = self.total_pages();
        let shown = PAGE_WINDOW.min(total);
        let offset = current
            .saturating_sub(3)
            .min(total.saturating_sub(PAGE_WINDOW));
        (1..=shown).map(|i| i + offset).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(id: i64, systolic: i32, date: &str, category: Option<&str>) -> BpReading {
        BpReading {
            id,
            user_id: None,
            systolic,
            diastolic: 70,
            pulse: None,
            measurement_date: date.to_string(),
            measurement_time: None,
            notes: None,
            source: None,
            is_abnormal: false,
            abnormality_details: None,
            category: category.map(String::from),
            created_at: None,
        }
    }

    #[test]
    fn test_twenty_three_rows_make_three_pages() {
        let rows: Vec<usize> = (1..=23).collect();
        let paginator = Paginator::new(rows.len());

        assert_eq!(paginator.total_pages(), 3);
        assert_eq!(paginator.page_items(&rows, 3), &[21, 22, 23]);
        assert_eq!(paginator.page_items(&rows, 1).len(), 10);
        assert!(paginator.page_items(&rows, 4).is_empty());
        assert_eq!(paginator.page_range(3), 20..23);
    }

    #[test]
    fn test_empty_table() {
        let paginator = Paginator::new(0);
        assert_eq!(paginator.total_pages(), 0);
        assert!(paginator.page_window(1).is_empty());
        assert_eq!(paginator.clamp_page(5), 1);
    }

    #[test]
    fn test_page_window_centres_and_clamps() {
        let paginator = Paginator::new(120); // 12 pages
        assert_eq!(paginator.page_window(1), vec![1, 2, 3, 4, 5]);
        assert_eq!(paginator.page_window(6), vec![4, 5, 6, 7, 8]);
        assert_eq!(paginator.page_window(12), vec![8, 9, 10, 11, 12]);

        let small = Paginator::new(23);
        assert_eq!(small.page_window(3), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_toggle() {
        let mut state = SortState::default();
        assert_eq!(state.column, SortColumn::MeasurementDate);
        assert_eq!(state.order, SortOrder::Desc);

        state.toggle(SortColumn::MeasurementDate);
        assert_eq!(state.order, SortOrder::Asc);

        state.toggle(SortColumn::Systolic);
        assert_eq!(state.column, SortColumn::Systolic);
        assert_eq!(state.order, SortOrder::Asc);

        state.toggle(SortColumn::Systolic);
        assert_eq!(state.order, SortOrder::Desc);
    }

    #[test]
    fn test_sort_readings() {
        let mut readings = vec![
            reading(1, 130, "2024-01-02T08:00", Some("Normal")),
            reading(2, 120, "2024-01-03T08:00", None),
            reading(3, 140, "2024-01-01T08:00", Some("Elevated")),
        ];

        SortState::default().sort(&mut readings);
        let ids: Vec<i64> = readings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let by_systolic = SortState {
            column: SortColumn::Systolic,
            order: SortOrder::Asc,
        };
        by_systolic.sort(&mut readings);
        let ids: Vec<i64> = readings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let by_category = SortState {
            column: SortColumn::Category,
            order: SortOrder::Asc,
        };
        by_category.sort(&mut readings);
        let labels: Vec<&str> = readings.iter().map(|r| r.category_label()).collect();
        assert_eq!(labels, vec!["Elevated", "Normal", "Unknown"]);
    }
}
