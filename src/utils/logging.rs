// Centralized logging for the auth, payment and issuance flows
use log::{debug, info, warn};

use crate::bridge::{BridgeError, Invoice};
use crate::models::InsuranceDocument;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log which host adapter was selected at startup
    pub fn log_host_detection(is_host: bool) {
        if is_host {
            info!("📱 Mini App host runtime detected");
        } else {
            info!("🌐 No host runtime, running in fallback mode");
        }
    }

    /// Log auth code exchange start
    pub fn log_auth_exchange_start(endpoint: &str) {
        info!("🔄 Exchanging host auth code for a session token at {endpoint}");
    }

    /// Log auth code exchange success
    pub fn log_auth_exchange_success(token_present: bool) {
        info!(
            "✅ Auth exchange succeeded (token={})",
            if token_present { "present" } else { "missing" }
        );
    }

    /// Log that authentication degraded to the local fallback
    pub fn log_auth_fallback(reason: &BridgeError) {
        warn!("⚠️  Host authentication failed, falling back to local session: {reason}");
    }

    /// Log session establishment
    pub fn log_session_established(user_id: &str, mode: &str) {
        info!("Successfully established {mode} session for user: {user_id}");
    }

    /// Log payment start
    pub fn log_payment_start(invoice: Option<&Invoice>) {
        match invoice {
            Some(invoice) => info!(
                "💳 Initiating payment for invoice {} (amount {})",
                invoice.invoice_id, invoice.amount
            ),
            None => info!("💳 Initiating payment"),
        }
    }

    /// Log the host pay UI outcome
    pub fn log_payment_result(success: bool) {
        if success {
            info!("✅ Host reported payment success");
        } else {
            warn!("❌ Host reported payment failure");
        }
    }

    /// Log document issuance
    pub fn log_document_created(document: &InsuranceDocument) {
        info!(
            "📄 Issued {} ({}) for user {}: {} {} days, premium {}",
            document.document_number,
            document.id,
            document.user_id,
            document.details.zone,
            document.details.duration,
            document.details.price
        );
    }

    /// Log the re-derived document view
    pub fn log_documents_filtered(user_id: Option<&str>, visible: usize, total: usize) {
        debug!(
            "Document view for {:?}: {visible} of {total} stored documents",
            user_id
        );
    }
}
