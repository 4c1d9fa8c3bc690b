use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use rusqlite::Connection;
use serde::Serialize;
use sha1::Sha1;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, PaymentMethod, PaymentStatus};

/// What the client needs to continue a payment: a signed redirect URL for
/// wallet gateways, or a transfer reference (plus its QR payload) for bank
/// transfers.
#[derive(Debug, Serialize)]
pub struct PaymentIntent {
    pub method: PaymentMethod,
    pub redirect_url: Option<String>,
    pub transfer_reference: Option<String>,
    pub qr_payload: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn method(&self) -> PaymentMethod;
    async fn create_payment(&self, booking: &Booking) -> anyhow::Result<PaymentIntent>;
}

/// Stand-in for a wallet gateway (MoMo, VNPay, ZaloPay). Builds the same
/// signed request a real integration would, but the URL points at the local
/// simulate endpoint instead of the gateway.
pub struct SimulatedGateway {
    method: PaymentMethod,
    endpoint: String,
    secret_key: String,
}

impl SimulatedGateway {
    pub fn new(method: PaymentMethod, endpoint: String, secret_key: String) -> Self {
        Self {
            method,
            endpoint,
            secret_key,
        }
    }

    fn sign(&self, booking: &Booking) -> String {
        let data = format!("{}|{:.0}", booking.id, booking.total_price);
        let mut mac = Hmac::<Sha1>::new_from_slice(self.secret_key.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(data.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl PaymentProvider for SimulatedGateway {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn create_payment(&self, booking: &Booking) -> anyhow::Result<PaymentIntent> {
        let signature = self.sign(booking);
        let url = format!(
            "{}?booking={}&amount={:.0}&signature={}",
            self.endpoint, booking.id, booking.total_price, signature
        );
        Ok(PaymentIntent {
            method: self.method,
            redirect_url: Some(url),
            transfer_reference: None,
            qr_payload: None,
        })
    }
}

/// Bank transfers have no gateway; the customer wires money using a
/// reference string and an admin verifies it by hand.
pub struct BankTransfer {
    reference_prefix: String,
}

impl BankTransfer {
    pub fn new(reference_prefix: String) -> Self {
        Self { reference_prefix }
    }

    pub fn reference(&self, booking: &Booking) -> String {
        format!("{}{}", self.reference_prefix, booking.id)
    }
}

#[async_trait]
impl PaymentProvider for BankTransfer {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Banking
    }

    async fn create_payment(&self, booking: &Booking) -> anyhow::Result<PaymentIntent> {
        let reference = self.reference(booking);
        let qr_payload = base64::engine::general_purpose::STANDARD.encode(&reference);
        Ok(PaymentIntent {
            method: PaymentMethod::Banking,
            redirect_url: None,
            transfer_reference: Some(reference),
            qr_payload: Some(qr_payload),
        })
    }
}

pub struct PaymentGateways {
    providers: Vec<Box<dyn PaymentProvider>>,
}

impl PaymentGateways {
    pub fn new(providers: Vec<Box<dyn PaymentProvider>>) -> Self {
        Self { providers }
    }

    pub fn get(&self, method: PaymentMethod) -> Option<&dyn PaymentProvider> {
        self.providers
            .iter()
            .find(|p| p.method() == method)
            .map(|p| p.as_ref())
    }
}

/// Wallet simulate-success path: the booking becomes paid and confirmed.
/// Running it again re-commits the same terminal state.
pub fn simulate_success(
    conn: &Connection,
    booking_id: &str,
    method: PaymentMethod,
) -> anyhow::Result<bool> {
    queries::set_payment_state(
        conn,
        booking_id,
        Some(method),
        PaymentStatus::Paid,
        BookingStatus::Confirmed,
    )
}

/// Customer says "I have transferred"; the booking waits for an admin.
pub fn record_bank_transfer(conn: &Connection, booking_id: &str) -> anyhow::Result<bool> {
    queries::set_payment_state(
        conn,
        booking_id,
        Some(PaymentMethod::Banking),
        PaymentStatus::Pending,
        BookingStatus::Pending,
    )
}

/// Admin verified the transfer. Returns false (and changes nothing) unless
/// the payment is currently pending, which guards against double handling.
pub fn confirm_bank_transfer(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    if booking.payment_status != PaymentStatus::Pending {
        return Ok(false);
    }
    queries::set_payment_state(
        conn,
        &booking.id,
        None,
        PaymentStatus::Paid,
        BookingStatus::Confirmed,
    )
}

/// Admin found no matching transfer. Same pending-only guard as confirm.
pub fn reject_bank_transfer(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    if booking.payment_status != PaymentStatus::Pending {
        return Ok(false);
    }
    queries::set_payment_state(
        conn,
        &booking.id,
        None,
        PaymentStatus::Failed,
        BookingStatus::Cancelled,
    )
}
