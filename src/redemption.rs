//! Ticket codes presented at the venue gate.
//!
//! A code is `booking_id|event_id|user_id` in hex. It carries no secret: a
//! scan is accepted only when all three ids match a stored paid booking.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use mongodb::bson::oid::ObjectId;
use qrcode::render::svg;
use qrcode::types::QrError;
use qrcode::QrCode;
use serde::Serialize;

use crate::models::{booking::Booking, event::EventSummary, user::UserSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionToken {
    pub booking_id: ObjectId,
    pub event_id: ObjectId,
    pub user_id: ObjectId,
}

impl RedemptionToken {
    pub fn new(booking_id: ObjectId, event_id: ObjectId, user_id: ObjectId) -> Self {
        RedemptionToken { booking_id, event_id, user_id }
    }

    /// The code as a `data:image/svg+xml;base64,...` URL, usable as an `<img>` source.
    pub fn qr_data_url(&self) -> Result<String, QrError> {
        let svg = render_qr_svg(&self.to_string())?;
        Ok(format!("data:image/svg+xml;base64,{}", general_purpose::STANDARD.encode(svg)))
    }
}

const QR_MIN_SIZE: u32 = 240;

fn render_qr_svg(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

impl fmt::Display for RedemptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.booking_id.to_hex(), self.event_id.to_hex(), self.user_id.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedToken;

impl FromStr for RedemptionToken {
    type Err = MalformedToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('|');
        let mut next_id = || {
            parts
                .next()
                .and_then(|p| ObjectId::parse_str(p).ok())
                .ok_or(MalformedToken)
        };
        let token = RedemptionToken::new(next_id()?, next_id()?, next_id()?);
        if parts.next().is_some() {
            return Err(MalformedToken);
        }
        Ok(token)
    }
}

/// What the gate scanner displays after a successful check.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemedTicket {
    pub booking: Booking,
    pub event: Option<EventSummary>,
    pub user: Option<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn parses_what_it_prints() {
        let token = RedemptionToken::new(ObjectId::new(), ObjectId::new(), ObjectId::new());
        let parsed: RedemptionToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn rejects_wrong_arity_and_bad_ids() {
        let a = ObjectId::new().to_hex();
        assert!(format!("{a}|{a}").parse::<RedemptionToken>().is_err());
        assert!(format!("{a}|{a}|{a}|{a}").parse::<RedemptionToken>().is_err());
        assert!(format!("{a}|{a}|not-an-id").parse::<RedemptionToken>().is_err());
        assert!("".parse::<RedemptionToken>().is_err());
    }

    fn decode_data_url(url: &str) -> String {
        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        String::from_utf8(general_purpose::STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn qr_image_encodes_the_ticket_code() {
        let token = RedemptionToken::new(ObjectId::new(), ObjectId::new(), ObjectId::new());
        let svg = decode_data_url(&token.qr_data_url().unwrap());
        assert!(svg.contains("<svg"));

        // Same modules as a code built straight from the printed token.
        let code = QrCode::new(token.to_string().as_bytes()).unwrap();
        let expected = code
            .render::<svg::Color>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        assert_eq!(svg, expected);

        let other = RedemptionToken::new(ObjectId::new(), token.event_id, token.user_id);
        assert_ne!(decode_data_url(&other.qr_data_url().unwrap()), svg);
    }
}
