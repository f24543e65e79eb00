//! Signed BOLT11 invoice fixtures.

use std::time::Duration;

use bitcoin::hashes::{Hash, sha256};
use lightning_invoice::{Currency, InvoiceBuilder};
use lightning_types::{
    payment::PaymentSecret,
    routing::{RouteHint, RouteHintHop, RoutingFees},
};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// The creation time of every generated invoice.
pub const TEST_TIMESTAMP: u64 = 1_700_000_000;

const NODE_SECRET: [u8; 32] = [0x42; 32];
const IDENTITY_SECRET: [u8; 32] = [0x07; 32];

/// Knobs for [`gen_invoice`]. The defaults give a mainnet invoice with no
/// amount, description "coffee", and payment hash `[0x01; 32]`.
#[derive(Clone, Debug, Default)]
pub struct InvoiceParams {
    pub amount_msat: Option<u64>,
    pub expiry: Option<Duration>,
    /// Add a synthetic route hint advertising [`identity_pubkey_hex`].
    pub identity_route_hint: bool,
    /// Add an ordinary route hint through a made-up channel.
    pub regular_route_hint: bool,
}

/// Un-builder-ify the [`InvoiceBuilder`] API so tests can pick options at
/// runtime. Returns the bech32-encoded invoice.
pub fn gen_invoice(params: InvoiceParams) -> String {
    let secp_ctx = Secp256k1::new();
    let node_sk = secret_key(NODE_SECRET);

    let mut invoice = InvoiceBuilder::new(Currency::Bitcoin)
        .description("coffee".to_owned())
        .duration_since_epoch(Duration::from_secs(TEST_TIMESTAMP))
        .payment_hash(sha256::Hash::from_byte_array([0x01; 32]))
        .payment_secret(PaymentSecret([0x02; 32]))
        .basic_mpp()
        .min_final_cltv_expiry_delta(144);

    if let Some(msat) = params.amount_msat {
        invoice = invoice.amount_milli_satoshis(msat);
    }
    if let Some(expiry) = params.expiry {
        invoice = invoice.expiry_time(expiry);
    }
    if params.identity_route_hint {
        invoice = invoice.private_route(route_hint(
            identity_pubkey(),
            0xf424_00f4_2400_0001,
        ));
    }
    if params.regular_route_hint {
        let lsp_sk = secret_key([9; 32]);
        let lsp_pk = PublicKey::from_secret_key(&secp_ctx, &lsp_sk);
        invoice = invoice.private_route(route_hint(lsp_pk, 0x0001_0002_0003));
    }

    let do_sign =
        |msg: &Message| secp_ctx.sign_ecdsa_recoverable(msg, &node_sk);
    invoice
        .build_signed(do_sign)
        .expect("Failed to build invoice")
        .to_string()
}

/// Hex-encoded pubkey advertised by `identity_route_hint` invoices.
pub fn identity_pubkey_hex() -> String {
    identity_pubkey().to_string()
}

fn identity_pubkey() -> PublicKey {
    PublicKey::from_secret_key(&Secp256k1::new(), &secret_key(IDENTITY_SECRET))
}

fn secret_key(bytes: [u8; 32]) -> SecretKey {
    SecretKey::from_slice(&bytes).expect("Valid secret key")
}

fn route_hint(src_node_id: PublicKey, short_channel_id: u64) -> RouteHint {
    RouteHint(vec![RouteHintHop {
        src_node_id,
        short_channel_id,
        fees: RoutingFees {
            base_msat: 0,
            proportional_millionths: 0,
        },
        cltv_expiry_delta: 144,
        htlc_minimum_msat: None,
        htlc_maximum_msat: None,
    }])
}
