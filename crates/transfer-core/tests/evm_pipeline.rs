mod common;

use std::sync::Arc;

use chain_eth::erc20::TRANSFER_SELECTOR;
use chain_eth::EthSignature;
use common::*;
use transfer_core::config::EvmConfig;
use transfer_core::ports::FeeMarketRate;
use transfer_core::{Asset, Baker, EvmBaker, EvmEnvelope, TransferError};

const RECIPIENT: &str = "0x000000000000000000000000000000000000dEaD";
const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

fn scenario_client() -> MockEvmClient {
    MockEvmClient {
        balance: 1_000_000,
        nonce: 7,
        rate: Some(FeeMarketRate {
            base_fee: 10,
            priority_fee: 5,
        }),
        gas: Some(1_000),
        token_balance: 1_000,
        ..Default::default()
    }
}

fn baker(client: Arc<MockEvmClient>) -> EvmBaker {
    EvmBaker::new(client, EvmConfig::default())
}

#[tokio::test]
async fn bake_and_send_native_transfer() {
    let client = Arc::new(scenario_client());
    let baker = baker(client.clone());
    let (sender, address) = evm_sender();
    let intent = intent(sender, RECIPIENT, Asset::Native, 100_000);

    let baked = baker.bake(&intent).await.unwrap();
    assert_eq!(baked.estimated_fee, 15_000);
    assert!(baked.warnings.is_empty());
    assert_eq!(baked.fee_quote.computation_units, 1_000);
    assert_eq!(baker.digest_of_state(&baked.opaque_state).unwrap(), baked.signing_digest);

    let envelope = EvmEnvelope::from_state(&baked.opaque_state).unwrap();
    let tx = &envelope.transaction;
    assert_eq!(tx.chain_id, 1);
    assert_eq!(tx.nonce, 7);
    assert_eq!(tx.gas_limit, 1_000);
    assert_eq!(tx.max_priority_fee_per_gas, 5);
    assert_eq!(tx.max_fee_per_gas, 15);
    assert_eq!(tx.value, 100_000);
    assert!(tx.data.is_empty());

    let signature = EthSignature::from_bytes(&secp_sign(&baked.signing_digest)).unwrap();
    assert_eq!(tx.recover_signer(&signature).unwrap(), address);

    let result = baker
        .send(&baked.opaque_state, &signature.to_compact(), &intent)
        .await
        .unwrap();
    let submitted = client.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(result.tx_id, chain_eth::transaction_hash(&submitted[0]));
    assert_eq!(submitted[0], tx.encode_signed(&signature));
}

#[tokio::test]
async fn full_length_signature_is_accepted() {
    let client = Arc::new(scenario_client());
    let baker = baker(client.clone());
    let (sender, _) = evm_sender();
    let intent = intent(sender, RECIPIENT, Asset::Native, 100_000);

    let baked = baker.bake(&intent).await.unwrap();
    let signature = secp_sign(&baked.signing_digest);
    assert_eq!(signature.len(), 65);
    baker.send(&baked.opaque_state, &signature, &intent).await.unwrap();
}

#[tokio::test]
async fn empty_signature_is_rejected_by_node() {
    let client = Arc::new(scenario_client());
    let baker = baker(client.clone());
    let (sender, _) = evm_sender();
    let intent = intent(sender, RECIPIENT, Asset::Native, 100_000);

    let baked = baker.bake(&intent).await.unwrap();
    let err = baker.send(&baked.opaque_state, &[], &intent).await.unwrap_err();
    assert!(matches!(err, TransferError::BroadcastRejected { ref code, .. } if code == "-32000"));
    assert!(client.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn odd_signature_length_fails_framing() {
    let client = Arc::new(scenario_client());
    let baker = baker(client.clone());
    let (sender, _) = evm_sender();
    let intent = intent(sender, RECIPIENT, Asset::Native, 100_000);

    let baked = baker.bake(&intent).await.unwrap();
    let err = baker.send(&baked.opaque_state, &[1; 70], &intent).await.unwrap_err();
    assert!(matches!(err, TransferError::SignatureFraming(_)));
}

#[tokio::test]
async fn insufficient_balance_counts_the_fee() {
    let client = Arc::new(MockEvmClient {
        balance: 114_999,
        ..scenario_client()
    });
    let (sender, _) = evm_sender();
    let err = baker(client)
        .bake(&intent(sender, RECIPIENT, Asset::Native, 100_000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::InsufficientBalance { required: 115_000, available: 114_999 }
    ));
}

#[tokio::test]
async fn fee_market_failure_degrades() {
    let client = Arc::new(MockEvmClient {
        rate: None,
        ..scenario_client()
    });
    let (sender, _) = evm_sender();
    let baked = baker(client.clone())
        .bake(&intent(sender, RECIPIENT, Asset::Native, 100_000))
        .await
        .unwrap();

    assert_eq!(baked.estimated_fee, 0);
    assert_eq!(baked.warnings.len(), 1);
    assert_eq!(baked.warnings[0].stage, "fee_market_rate");
    let envelope = EvmEnvelope::from_state(&baked.opaque_state).unwrap();
    assert_eq!(envelope.transaction.gas_limit, 21_000);
    assert!(client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn gas_estimation_failure_keeps_rates() {
    let client = Arc::new(MockEvmClient {
        gas: None,
        ..scenario_client()
    });
    let (sender, _) = evm_sender();
    let baked = baker(client)
        .bake(&intent(sender, USDT, Asset::Native, 100_000))
        .await
        .unwrap();

    assert_eq!(baked.estimated_fee, 0);
    assert_eq!(baked.warnings[0].stage, "estimate_gas");
    let tx = EvmEnvelope::from_state(&baked.opaque_state).unwrap().transaction;
    assert_eq!(tx.gas_limit, 21_000);
    assert_eq!(tx.max_fee_per_gas, 15);
}

#[tokio::test]
async fn token_transfer_calls_the_contract() {
    let client = Arc::new(scenario_client());
    let (sender, address) = evm_sender();
    let baked = baker(client.clone())
        .bake(&intent(sender, RECIPIENT, Asset::Contract(USDT.into()), 500))
        .await
        .unwrap();

    let tx = EvmEnvelope::from_state(&baked.opaque_state).unwrap().transaction;
    assert_eq!(tx.to, chain_eth::parse_address(USDT).unwrap());
    assert_eq!(tx.value, 0);
    assert_eq!(tx.data[..4], TRANSFER_SELECTOR);

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls[0].from, address);
    assert_eq!(calls[0].data, tx.data);
}

#[tokio::test]
async fn token_balance_is_checked() {
    let client = Arc::new(MockEvmClient {
        token_balance: 499,
        ..scenario_client()
    });
    let (sender, _) = evm_sender();
    let err = baker(client)
        .bake(&intent(sender, RECIPIENT, Asset::Contract(USDT.into()), 500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::InsufficientBalance { required: 500, available: 499 }
    ));
}

#[tokio::test]
async fn ens_recipient_is_resolved() {
    let target = [0xab; 20];
    let mut client = scenario_client();
    client.names.insert("alice.eth".to_string(), target);
    let (sender, _) = evm_sender();

    let baker = baker(Arc::new(client));
    let baked = baker
        .bake(&intent(sender.clone(), "alice.eth", Asset::Native, 1))
        .await
        .unwrap();
    let tx = EvmEnvelope::from_state(&baked.opaque_state).unwrap().transaction;
    assert_eq!(tx.to, target);

    let err = baker
        .bake(&intent(sender, "bob.eth", Asset::Native, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::AddressResolution(_)));
}

#[tokio::test]
async fn tampered_state_is_not_submitted() {
    let client = Arc::new(scenario_client());
    let baker = baker(client.clone());
    let (sender, _) = evm_sender();
    let intent = intent(sender, RECIPIENT, Asset::Native, 100_000);

    let baked = baker.bake(&intent).await.unwrap();
    let signature = secp_sign(&baked.signing_digest);
    let mut tampered = baked.opaque_state.clone();
    let mid = tampered.len() / 2;
    tampered[mid] ^= 0xff;

    let err = baker.send(&tampered, &signature, &intent).await.unwrap_err();
    assert!(matches!(err, TransferError::MalformedResumableState(_)));
    assert!(client.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn state_for_another_sender_is_malformed() {
    let client = Arc::new(scenario_client());
    let baker = baker(client);
    let (sender, _) = evm_sender();
    let baked = baker
        .bake(&intent(sender.clone(), RECIPIENT, Asset::Native, 1))
        .await
        .unwrap();

    let mut other = intent(sender, RECIPIENT, Asset::Native, 1);
    other.sender.address = RECIPIENT.to_string();
    let err = baker
        .send(&baked.opaque_state, &secp_sign(&baked.signing_digest), &other)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::MalformedResumableState(_)));
}

#[tokio::test]
async fn failed_required_read_is_network_error() {
    let client = Arc::new(MockEvmClient {
        fail_reads: true,
        ..scenario_client()
    });
    let (sender, _) = evm_sender();
    let err = baker(client)
        .bake(&intent(sender, RECIPIENT, Asset::Native, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NetworkUnavailable(_)));
}

#[tokio::test]
async fn foreign_sender_address_is_unsupported() {
    let (mut sender, _) = evm_sender();
    sender.address = RECIPIENT.to_string();
    let err = baker(Arc::new(scenario_client()))
        .bake(&intent(sender, RECIPIENT, Asset::Native, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::UnsupportedWalletVersion(_)));
}
