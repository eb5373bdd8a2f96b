use chrono::{Datelike, Local, Month, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// What a listing line says the entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// The "." pseudo-entry.
    SelfRef,
    /// The ".." pseudo-entry.
    Parent,
    /// The server gave no type information.
    Unknown,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub size: u64,
    pub timestamp: Option<NaiveDateTime>,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn new(name: &str, kind: EntryKind) -> Self {
        let kind = match name {
            "." => EntryKind::SelfRef,
            ".." => EntryKind::Parent,
            _ => kind,
        };
        Self {
            name: name.to_string(),
            size: 0,
            timestamp: None,
            kind,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// "." and "..", which recursive walks must skip.
    pub fn is_pseudo(&self) -> bool {
        matches!(self.kind, EntryKind::SelfRef | EntryKind::Parent)
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

static UNIX_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<type>[-dlbcps])[-rwxsStTlL]{9}[.+@]?\s+\d+\s+(?:\S+\s+){1,2}?(?P<size>\d+)\s+(?P<month>[A-Za-z]{3})\s+(?P<day>\d{1,2})\s+(?P<when>\d{1,2}:\d{2}|\d{4})\s+(?P<name>.+)$",
    )
    .expect("unix listing pattern")
});

static DOS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>\d{2}-\d{2}-\d{2,4})\s+(?P<time>\d{1,2}:\d{2}\s*[AaPp][Mm])\s+(?P<size><DIR>|\d+)\s+(?P<name>.+)$",
    )
    .expect("dos listing pattern")
});

/// Parses the text of a LIST data transfer. Lines that are not entries
/// (`total 12`, blank lines) are skipped.
pub fn parse_listing(text: &str) -> Vec<RemoteEntry> {
    let today = Local::now().date_naive();
    text.lines()
        .filter_map(|line| parse_list_line(line, today))
        .collect()
}

pub fn parse_list_line(line: &str, today: NaiveDate) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.trim().is_empty() {
        return None;
    }
    if let Some(caps) = UNIX_LINE.captures(line) {
        return parse_unix(&caps, today);
    }
    if let Some(caps) = DOS_LINE.captures(line) {
        return parse_dos(&caps);
    }
    None
}

fn parse_unix(caps: &regex::Captures<'_>, today: NaiveDate) -> Option<RemoteEntry> {
    let kind = match &caps["type"] {
        "d" => EntryKind::Directory,
        "l" => EntryKind::Symlink,
        _ => EntryKind::File,
    };
    let mut name = caps["name"].to_string();
    if kind == EntryKind::Symlink {
        if let Some(arrow) = name.find(" -> ") {
            name.truncate(arrow);
        }
    }
    let size = caps["size"].parse::<u64>().ok()?;

    let mut entry = RemoteEntry::new(&name, kind).with_size(size);
    if let Some(timestamp) = unix_timestamp(&caps["month"], &caps["day"], &caps["when"], today) {
        entry = entry.with_timestamp(timestamp);
    }
    Some(entry)
}

fn unix_timestamp(month: &str, day: &str, when: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let month = month.parse::<Month>().ok()?.number_from_month();
    let day = day.parse::<u32>().ok()?;

    if let Some((hour, minute)) = when.split_once(':') {
        // Recent files carry a time instead of a year; anything that would
        // land in the future belongs to last year.
        let time = NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)?;
        let mut date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
        if date > today.succ_opt().unwrap_or(today) {
            date = NaiveDate::from_ymd_opt(today.year() - 1, month, day)?;
        }
        Some(date.and_time(time))
    } else {
        let year = when.parse::<i32>().ok()?;
        Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(NaiveTime::MIN))
    }
}

fn parse_dos(caps: &regex::Captures<'_>) -> Option<RemoteEntry> {
    let (kind, size) = match &caps["size"] {
        "<DIR>" => (EntryKind::Directory, 0),
        digits => (EntryKind::File, digits.parse::<u64>().ok()?),
    };
    let mut entry = RemoteEntry::new(&caps["name"], kind).with_size(size);

    let date = NaiveDate::parse_from_str(&caps["date"], "%m-%d-%y")
        .or_else(|_| NaiveDate::parse_from_str(&caps["date"], "%m-%d-%Y"))
        .ok();
    let time: String = caps["time"].split_whitespace().collect();
    let time = NaiveTime::parse_from_str(&time.to_ascii_uppercase(), "%I:%M%p").ok();
    if let (Some(date), Some(time)) = (date, time) {
        entry = entry.with_timestamp(date.and_time(time));
    }
    Some(entry)
}
