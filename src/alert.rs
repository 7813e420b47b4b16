//! Alert text for the chat: the "rooms available" message and the operator notices.
//!
//! A message is an ordered list of [`Section`]s; nothing is rendered to text until
//! [`AlertMessage::render`], so tests can inspect the structure directly.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::AlertConfig;
use crate::hotels::types::{detail_text, BookingQuery, RoomAvailability};

const HEAVY_RULE_LEN: usize = 35;
const ROOMS_RULE_LEN: usize = 41;
const RULE_LEN: usize = 30;
const MAX_ERROR_CHARS: usize = 300;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("room '{room}' has no price")]
    MissingPrice { room: String },
    #[error("timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),
}

/// Stay total: computed when the nightly amount is an integer, otherwise the raw amount.
#[derive(Debug, Clone, PartialEq)]
pub enum StayTotal {
    Computed(i64),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomBlock {
    pub position: usize,
    pub name: String,
    pub nightly: String,
    pub currency: String,
    pub total: StayTotal,
    pub max_persons: Option<String>,
    pub size: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Header { property: String },
    Stay {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        nights: i64,
        adults: u32,
        children: u32,
    },
    RoomsHeading,
    Room(RoomBlock),
    Booking { url: String, phone: String, email: String },
    Footer { found_at: DateTime<Utc>, signature: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    sections: Vec<Section>,
    nights: i64,
}

fn utc_from_millis(ms: i64) -> Result<DateTime<Utc>, FormatError> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or(FormatError::InvalidTimestamp(ms))
}

pub fn booking_url(base: &str, query: &BookingQuery) -> String {
    format!(
        "{}?checkIn={}&checkOut={}&adults={}&children={}&lang=en",
        base, query.check_in, query.check_out, query.adults, query.children
    )
}

fn room_block(position: usize, room: &RoomAvailability, nights: i64) -> Result<RoomBlock, FormatError> {
    let price = room.room.price.as_ref().ok_or_else(|| FormatError::MissingPrice {
        room: room.name().to_string(),
    })?;

    let total = match price
        .amount
        .as_integer()
        .and_then(|amount| amount.checked_mul(nights))
    {
        Some(total) => StayTotal::Computed(total),
        None => StayTotal::Literal(price.amount.to_string()),
    };

    Ok(RoomBlock {
        position,
        name: room.name().to_string(),
        nightly: price.amount.to_string(),
        currency: price.currency.clone(),
        total,
        max_persons: detail_text(room.room.max_persons.as_ref()),
        size: detail_text(room.room.size.as_ref()),
        room_id: detail_text(room.room.room_id.as_ref()),
    })
}

impl AlertMessage {
    /// Build the "target rooms available" alert for rooms that already passed the filter.
    pub fn rooms_available(
        rooms: &[RoomAvailability],
        query: &BookingQuery,
        booking_base: &str,
        alert: &AlertConfig,
        found_at: DateTime<Utc>,
    ) -> Result<Self, FormatError> {
        let check_in = utc_from_millis(query.check_in)?;
        let check_out = utc_from_millis(query.check_out)?;
        let nights = query
            .nights()
            .ok_or(FormatError::InvalidTimestamp(query.check_out))?;
        let mut sections = vec![
            Section::Header {
                property: alert.property_name.clone(),
            },
            Section::Stay {
                check_in,
                check_out,
                nights,
                adults: query.adults,
                children: query.children,
            },
            Section::RoomsHeading,
        ];

        for (i, room) in rooms.iter().enumerate() {
            sections.push(Section::Room(room_block(i + 1, room, nights)?));
        }

        sections.push(Section::Booking {
            url: booking_url(booking_base, query),
            phone: alert.phone.clone(),
            email: alert.email.clone(),
        });
        sections.push(Section::Footer {
            found_at,
            signature: alert.signature.clone(),
        });

        Ok(Self { sections, nights })
    }

    #[cfg(test)]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn room_blocks(&self) -> impl Iterator<Item = &RoomBlock> {
        self.sections.iter().filter_map(|s| match s {
            Section::Room(block) => Some(block),
            _ => None,
        })
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for section in &self.sections {
            self.render_section(section, &mut lines);
        }
        lines.join("\n")
    }

    fn render_section(&self, section: &Section, lines: &mut Vec<String>) {
        match section {
            Section::Header { property } => {
                lines.push("🚨 TARGET ROOMS AVAILABLE! 🚨".to_string());
                lines.push(format!("🏨 {}", property.to_uppercase()));
                lines.push("═".repeat(HEAVY_RULE_LEN));
                lines.push(String::new());
            }
            Section::Stay {
                check_in,
                check_out,
                nights,
                adults,
                children,
            } => {
                lines.push(format!("📅 Check-in:  {}", check_in.format("%d %b %Y")));
                lines.push(format!("📅 Check-out: {}", check_out.format("%d %b %Y")));
                lines.push(format!("🌙 Nights:    {}", nights));
                lines.push(format!("👥 Guests:    {} adults, {} children", adults, children));
                lines.push(String::new());
            }
            Section::RoomsHeading => {
                lines.push("🎯 YOUR TARGET ROOMS ARE AVAILABLE:".to_string());
                lines.push("━".repeat(ROOMS_RULE_LEN));
            }
            Section::Room(block) => {
                lines.push(String::new());
                lines.push(format!("✅ {}. {}", block.position, block.name));
                lines.push(format!("   💰 {} {} per night", block.nightly, block.currency));
                match &block.total {
                    StayTotal::Computed(total) => lines.push(format!(
                        "   💵 Total: {} {} ({} nights)",
                        total, block.currency, self.nights
                    )),
                    StayTotal::Literal(amount) => lines.push(format!(
                        "   💵 Total: {} x {} nights",
                        amount, self.nights
                    )),
                }
                if let Some(max) = &block.max_persons {
                    lines.push(format!("   👥 Max guests: {}", max));
                }
                if let Some(size) = &block.size {
                    lines.push(format!("   📐 Size: {} m²", size));
                }
                if let Some(id) = &block.room_id {
                    lines.push(format!("   🆔 Room ID: {}", id));
                }
            }
            Section::Booking { url, phone, email } => {
                lines.push(String::new());
                lines.push("🚀 BOOK NOW - DON'T MISS OUT!".to_string());
                lines.push("━".repeat(RULE_LEN));
                lines.push("🔗 Direct booking link:".to_string());
                lines.push(url.clone());
                lines.push(String::new());
                lines.push("📞 Alternative booking (faster):".to_string());
                lines.push(format!("• Phone: {}", phone));
                lines.push(format!("• Email: {}", email));
                lines.push(String::new());
                lines.push("⚡ URGENT: These rooms may sell out quickly!".to_string());
                lines.push(String::new());
            }
            Section::Footer { found_at, signature } => {
                lines.push("━".repeat(RULE_LEN));
                lines.push(format!("🕐 Found: {} UTC", found_at.format("%d %b %Y at %H:%M")));
                lines.push(format!("🤖 {}", signature));
            }
        }
    }
}

/// Operator notice for a 403 from the search endpoint.
pub fn auth_expired_text() -> String {
    [
        "🚨 Authentication Failed!",
        "",
        "Your XSRF_TOKEN or BSESSION has expired.",
        "Please update the GitHub secrets with fresh tokens.",
    ]
    .join("\n")
}

/// Operator notice for any other failed check. The error text is capped.
pub fn monitor_error_text(property: &str, now: DateTime<Utc>, error: &str) -> String {
    let error: String = error.chars().take(MAX_ERROR_CHARS).collect();
    format!(
        "🚨 {} Monitor Error\n\nTime: {} UTC\nError: {}\n\nMonitoring continues...",
        property,
        now.format("%Y-%m-%d %H:%M"),
        error
    )
}
