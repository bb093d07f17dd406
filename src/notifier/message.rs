//! Notification message text.

use std::fmt::Display;

use chrono::{DateTime, Datelike, TimeZone};

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Buddhist Era year = Gregorian year + 543.
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Build the new-case message for `folder_name` created at `at`.
///
/// The date is written in Thai with a Buddhist Era year and a 24-hour
/// `HH.MM` time, in whatever zone `at` carries.
#[must_use]
pub fn compose_message<Tz>(folder_name: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let month = THAI_MONTHS[at.month0() as usize];
    format!(
        "มีโฟลเดอร์ Case ใหม่ชื่อ {folder_name}\nสร้างเมื่อ {day:02} {month} {year} เวลา {time} น.",
        day = at.day(),
        year = at.year() + BUDDHIST_ERA_OFFSET,
        time = at.format("%H.%M"),
    )
}
