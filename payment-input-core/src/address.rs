use std::str::FromStr;

use bitcoin::{Network, address::NetworkUnchecked};

/// Parse `s` as a standalone on-chain address: base58check P2PKH / P2SH or
/// bech32(m) segwit, in either all-lowercase or all-uppercase form.
///
/// If `network` is given, the address must also be valid for that network.
pub fn parse_onchain_address(
    s: &str,
    network: Option<Network>,
) -> Option<bitcoin::Address<NetworkUnchecked>> {
    let address = bitcoin::Address::<NetworkUnchecked>::from_str(s).ok()?;
    match network {
        Some(network) if !address.is_valid_for_network(network) => None,
        _ => Some(address),
    }
}

/// Returns `true` if `s` is a valid on-chain address.
pub fn is_onchain_address(s: &str, network: Option<Network>) -> bool {
    parse_onchain_address(s, network).is_some()
}
