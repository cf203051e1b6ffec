//! Ticket Signer
//!
//! HMAC-SHA256 signatures over a ticket's QR payload string. Signature
//! verification is deliberately decoupled from identifier parsing and from
//! persisted state, so a scanner can reject forged codes without any network
//! access; only a valid-looking code proceeds to the stateful checks.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// QR payload prefix. The full shape `ticket:<id>:<event>:<guest>` is printed
/// into QR codes and must remain stable: printed and cached tickets have to
/// keep validating.
const QR_PREFIX: &str = "ticket";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TicketError {
    #[error("Invalid QR code format")]
    InvalidQrCodeFormat,

    #[error("Signature generation failed")]
    SignatureGeneration,
}

/// Stateless signer/verifier for ticket QR payloads.
#[derive(Clone)]
pub struct TicketSigner {
    key: Vec<u8>,
}

impl TicketSigner {
    pub fn new(signing_secret: &str) -> Self {
        Self {
            key: signing_secret.as_bytes().to_vec(),
        }
    }

    /// Produce the canonical QR payload and its detached signature.
    ///
    /// The signature is standard base64 (padded) of HMAC-SHA256 over the
    /// UTF-8 bytes of the payload string.
    pub fn sign(
        &self,
        ticket_id: Uuid,
        event_id: Uuid,
        guest_id: Uuid,
    ) -> Result<(String, String), TicketError> {
        let qr_code = format!("{}:{}:{}:{}", QR_PREFIX, ticket_id, event_id, guest_id);
        let signature = self.signature_for(&qr_code)?;
        Ok((qr_code, signature))
    }

    /// Offline signature check. Any internal error is reported as `false`,
    /// never as a panic or a silent pass.
    pub fn verify_signature(&self, qr_code: &str, signature: &str) -> bool {
        let provided = match BASE64.decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let mut mac = match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(qr_code.as_bytes());
        let expected = mac.finalize().into_bytes();

        expected.ct_eq(provided.as_slice()).into()
    }

    fn signature_for(&self, qr_code: &str) -> Result<String, TicketError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| TicketError::SignatureGeneration)?;
        mac.update(qr_code.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Parse a QR payload into its ticket/event/guest identifiers.
///
/// Requires exactly four colon-delimited fields with the literal `ticket`
/// prefix and three valid UUIDs.
pub fn parse_qr_code(qr_code: &str) -> Result<(Uuid, Uuid, Uuid), TicketError> {
    let parts: Vec<&str> = qr_code.split(':').collect();
    if parts.len() != 4 || parts[0] != QR_PREFIX {
        return Err(TicketError::InvalidQrCodeFormat);
    }

    let ticket_id = Uuid::parse_str(parts[1]).map_err(|_| TicketError::InvalidQrCodeFormat)?;
    let event_id = Uuid::parse_str(parts[2]).map_err(|_| TicketError::InvalidQrCodeFormat)?;
    let guest_id = Uuid::parse_str(parts[3]).map_err(|_| TicketError::InvalidQrCodeFormat)?;

    Ok((ticket_id, event_id, guest_id))
}
