//! Translation of UI filter selections into feed query parameters.

use chrono::{DateTime, Local, Months};

use crate::client::{AuthorIds, FeedQuery};

/// Publication-date window selected in the filter sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationDate {
    Today,
    Week,
    Month,
    All,
}

impl PublicationDate {
    /// Parse the UI's string value; unknown values mean no date filter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Sort order selected in the filter sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Recent,
    Oldest,
    Popular,
}

impl SortBy {
    /// Parse the UI's string value; unknown values mean no sort override.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "recent" => Some(Self::Recent),
            "oldest" => Some(Self::Oldest),
            "popular" => Some(Self::Popular),
            _ => None,
        }
    }
}

/// The filter state as the UI holds it.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub post_types: Vec<String>,
    /// Comma-joined author ids, as emitted by the author picker.
    pub author_ids: Option<String>,
    pub publication_date: Option<PublicationDate>,
    pub sort_by: Option<SortBy>,
    pub search: Option<String>,
}

/// Translate a filter selection into feed query parameters, windows computed
/// relative to the current local time.
#[must_use]
pub fn translate_filters(selection: &FilterSelection) -> FeedQuery {
    translate_filters_at(selection, Local::now())
}

/// Same as [`translate_filters`] with an explicit "now", so the date window
/// math is testable without clock control.
#[must_use]
pub fn translate_filters_at(selection: &FilterSelection, now: DateTime<Local>) -> FeedQuery {
    let mut query = FeedQuery::default();

    if !selection.post_types.is_empty() {
        query.post_types = Some(selection.post_types.clone());
    }
    query.search = selection.search.clone().filter(|s| !s.is_empty());
    query.author_ids = selection.author_ids.as_deref().and_then(split_author_ids);

    if let Some((start, end)) = date_window(selection.publication_date, now) {
        query.start_date = Some(start);
        query.end_date = Some(end);
    }

    if let Some((order_by, order)) = sort_params(selection.sort_by) {
        query.order_by = Some(order_by.to_string());
        query.order = Some(order.to_string());
    }

    query
}

/// `[start, end]` window for a publication-date choice, or `None` when no
/// date filter applies: today runs from local midnight, week from 7 days
/// back, month from one calendar month back, all ending at `now`.
fn date_window(
    choice: Option<PublicationDate>,
    now: DateTime<Local>,
) -> Option<(DateTime<Local>, DateTime<Local>)> {
    let start = match choice? {
        PublicationDate::Today => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
            .unwrap_or(now),
        PublicationDate::Week => now - chrono::Duration::days(7),
        PublicationDate::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
        PublicationDate::All => return None,
    };
    Some((start, now))
}

/// `(orderBy, order)` pair for a sort choice.
fn sort_params(choice: Option<SortBy>) -> Option<(&'static str, &'static str)> {
    match choice? {
        SortBy::Recent => Some(("createdAt", "desc")),
        SortBy::Oldest => Some(("createdAt", "asc")),
        SortBy::Popular => Some(("reactionsCount", "desc")),
    }
}

/// Split the comma-joined author string into the backend's two wire shapes:
/// a scalar for one id, a list for several. Blank segments are dropped.
fn split_author_ids(joined: &str) -> Option<AuthorIds> {
    let ids: Vec<String> = joined
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect();

    match ids.len() {
        0 => None,
        1 => Some(AuthorIds::One(ids.into_iter().next()?)),
        _ => Some(AuthorIds::Many(ids)),
    }
}
