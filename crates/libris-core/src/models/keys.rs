//! Field keys of a book record.

pub const AUTHORS: &str = "authors";
pub const SERIES: &str = "series";
pub const PUBLISHERS: &str = "publishers";
pub const TOC: &str = "toc";

pub const COVER_FRONT: &str = "cover_0";
pub const COVER_BACK: &str = "cover_1";

pub const TITLE: &str = "title";
pub const ORIGINAL_TITLE: &str = "original_title";
pub const ISBN: &str = "isbn";
pub const LANGUAGE: &str = "language";
pub const DESCRIPTION: &str = "description";
pub const DATE_PUBLISHED: &str = "date_published";
pub const FIRST_PUBLICATION: &str = "first_publication";
pub const PAGES: &str = "pages";
pub const FORMAT: &str = "format";
pub const GENRE: &str = "genre";
pub const EDITION: &str = "edition";
pub const PRICE_LISTED: &str = "price_listed";
pub const PRICE_LISTED_CURRENCY: &str = "price_listed_currency";
pub const RATING: &str = "rating";

pub const LIST_KEYS: [&str; 4] = [AUTHORS, SERIES, PUBLISHERS, TOC];

pub const COVER_KEYS: [&str; 2] = [COVER_FRONT, COVER_BACK];

pub fn is_list_key(key: &str) -> bool {
    LIST_KEYS.contains(&key)
}

/// Key of the cover slot with the given index (0 = front, 1 = back).
pub fn cover(index: usize) -> Option<&'static str> {
    COVER_KEYS.get(index).copied()
}
