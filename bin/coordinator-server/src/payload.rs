pub mod request;
pub mod response;

use alephium_multisig_coordinator_codec::descriptor_address;
use alephium_multisig_coordinator_domain::{
    descriptor::MultisigDescriptor,
    tx::{ALPH_DECIMALS, Confirmation, SubmissionResult, SubmissionResultDissolved},
};
use alephium_multisig_coordinator_engine::{
    SignatureCollector, format_amount,
    response::{DisplayAmount, TxSummary},
};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Builder, Serialize)]
pub struct MultisigPayload {
    name: String,
    address: String,
    signers: Vec<SignerPayload>,
    m_of_n: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Serialize)]
pub struct SignerPayload {
    name: String,
    public_key: String,
    slot_index: u8,
}

#[derive(Debug, Builder, Serialize)]
pub struct SessionSignerPayload {
    label: String,
    public_key: String,
    slot_index: u8,
    signed: bool,
}

/// The signature collection session as shown to the coordinator.
#[derive(Debug, Builder, Serialize)]
pub struct SessionPayload {
    state: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    tx_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    unsigned_tx: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    multisig: Option<String>,

    signers: Vec<SessionSignerPayload>,

    // set when the unlock script matches no stored multisig
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Debug, Builder, Serialize)]
pub struct AmountPayload {
    token_id: String,
    symbol: String,
    amount: String,
}

#[derive(Debug, Builder, Serialize)]
pub struct SummaryPayload {
    tx_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    recipient: Option<String>,

    amounts: Vec<AmountPayload>,

    /// Fee in ALPH
    fee: String,
}

#[derive(Debug, Builder, Serialize)]
pub struct SubmissionPayload {
    tx_id: String,
    from_group: u32,
    to_group: u32,
    confirmed: bool,
    poll_attempts: u32,
}

impl From<MultisigDescriptor> for MultisigPayload {
    fn from(descriptor: MultisigDescriptor) -> Self {
        let signers = descriptor
            .slots()
            .iter()
            .map(|slot| {
                SignerPayload::builder()
                    .name(slot.name().to_owned())
                    .public_key(slot.public_key().to_string())
                    .slot_index(slot.slot_index())
                    .build()
            })
            .collect();

        Self::builder()
            .address(descriptor_address(&descriptor))
            .name(descriptor.name().to_owned())
            .signers(signers)
            .m_of_n(descriptor.threshold().get())
            .created_at(descriptor.aux().created_at())
            .updated_at(descriptor.aux().updated_at())
            .build()
    }
}

impl From<&SignatureCollector> for SessionPayload {
    fn from(collector: &SignatureCollector) -> Self {
        let signers = collector
            .signers()
            .iter()
            .map(|signer| {
                SessionSignerPayload::builder()
                    .label(signer.label().to_owned())
                    .public_key(signer.public_key().to_string())
                    .slot_index(signer.slot_index())
                    .signed(collector.has_signed(signer.label()))
                    .build()
            })
            .collect();

        let tx = collector.tx();
        let warning = (tx.is_some() && collector.descriptor_name().is_none())
            .then(|| "unlock script matches no stored multisig, signers are labelled by public key".to_owned());

        Self::builder()
            .state(collector.state().to_string())
            .maybe_tx_id(tx.map(|tx| tx.tx_id().to_string()))
            .maybe_unsigned_tx(tx.map(|tx| tx.to_hex()))
            .maybe_multisig(collector.descriptor_name().map(ToOwned::to_owned))
            .signers(signers)
            .maybe_warning(warning)
            .build()
    }
}

impl From<DisplayAmount> for AmountPayload {
    fn from(amount: DisplayAmount) -> Self {
        Self::builder()
            .token_id(amount.token_id().to_string())
            .symbol(amount.symbol().to_owned())
            .amount(amount.amount().to_owned())
            .build()
    }
}

impl SummaryPayload {
    pub fn new(summary: &TxSummary, amounts: Vec<DisplayAmount>) -> Self {
        Self::builder()
            .tx_id(summary.tx_id().to_string())
            .maybe_recipient(summary.recipient().map(ToOwned::to_owned))
            .amounts(amounts.into_iter().map(From::from).collect())
            .fee(format_amount(summary.fee(), ALPH_DECIMALS))
            .build()
    }
}

impl From<SubmissionResult> for SubmissionPayload {
    fn from(result: SubmissionResult) -> Self {
        let SubmissionResultDissolved { tx_id, receipt, confirmation } = result.dissolve();

        let (confirmed, poll_attempts) = match confirmation {
            Confirmation::Indexed { attempts } => (true, attempts),
            Confirmation::Unconfirmed { attempts } => (false, attempts),
        };

        Self::builder()
            .tx_id(tx_id.to_string())
            .from_group(receipt.from_group())
            .to_group(receipt.to_group())
            .confirmed(confirmed)
            .poll_attempts(poll_attempts)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use alephium_multisig_coordinator_domain::{Timestamps, tx::{NodeReceipt, TxId}};
    use alephium_multisig_test_utils::descriptor;

    use super::*;

    #[test]
    fn multisig_payload_carries_address_and_slots() {
        let (d, ()) = descriptor("treasury", &["alice", "bob", "carol"], 2).with_aux(Timestamps::now());
        let address = descriptor_address(&d);

        let json = serde_json::to_value(MultisigPayload::from(d)).unwrap();

        assert_eq!(json["address"], address.as_str());
        assert_eq!(json["m_of_n"], 2);
        assert_eq!(json["signers"][2]["name"], "carol");
        assert_eq!(json["signers"][2]["slot_index"], 2);
    }

    #[test]
    fn unconfirmed_submission_is_reported_softly() {
        let result = SubmissionResult::builder()
            .tx_id(TxId::from([7; 32]))
            .receipt(NodeReceipt::builder().from_group(0).to_group(1).build())
            .confirmation(Confirmation::Unconfirmed { attempts: 10 })
            .build();

        let json = serde_json::to_value(SubmissionPayload::from(result)).unwrap();

        assert_eq!(json["confirmed"], false);
        assert_eq!(json["poll_attempts"], 10);
        assert_eq!(json["to_group"], 1);
    }

    #[test]
    fn empty_session() {
        let json = serde_json::to_value(SessionPayload::from(&SignatureCollector::new())).unwrap();

        assert_eq!(json["state"], "empty");
        assert!(json.get("tx_id").is_none());
        assert!(json.get("warning").is_none());
        assert_eq!(json["signers"].as_array().map(Vec::len), Some(0));
    }
}
