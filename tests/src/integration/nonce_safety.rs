//! # Nonce Safety Flows
//!
//! Many sends against one account through `AccountAgent`, with outcomes
//! delivered late, out of order, or not at all.

#[cfg(test)]
mod tests {
    use rs_02_account_agent::{
        AccountAgent, AccountApi, AgentConfig, BroadcastOutcome, ChainPorts, InMemoryChain,
        ScriptedOutcome, TransactionReceipt, TransactionStatus, TransactionTemplate,
    };
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::ManualTimeSource;
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CHANNELS_CONTRACT: [u8; 20] = [0xC0; 20];

    fn agent_on(
        chain: &Arc<InMemoryChain>,
        seed: u8,
        time: Arc<ManualTimeSource>,
    ) -> Arc<AccountAgent> {
        super::super::fixtures::setup();
        Arc::new(AccountAgent::new(
            Secp256k1KeyPair::from_bytes([seed; 32]).unwrap(),
            AgentConfig::default(),
            ChainPorts::in_memory(chain.clone()),
            time,
        ))
    }

    fn call(tag: u8) -> TransactionTemplate {
        TransactionTemplate::call(CHANNELS_CONTRACT, vec![tag])
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_nonce_follows_chain_then_pending() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let agent = agent_on(&chain, 1, Arc::new(ManualTimeSource::new(0)));
        chain.set_transaction_count(*agent.account().as_bytes(), 5);
        chain.push_outcome(ScriptedOutcome::Hold);

        let first = agent.send(call(1)).await.unwrap();
        assert_eq!(first.nonce, 5);

        let second = agent.send(call(2)).await.unwrap();
        assert_eq!(second.nonce, 6);
    }

    #[tokio::test]
    async fn test_stale_pending_nonce_is_reused() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let time = Arc::new(ManualTimeSource::new(0));
        let agent = agent_on(&chain, 1, time.clone());

        agent.ledger().add_pending([7; 32], 7);
        time.advance(agent.config().nonce.stale_after_ms + 1);
        chain.set_transaction_count(*agent.account().as_bytes(), 6);

        let sent = agent.send(call(1)).await.unwrap();
        assert_eq!(sent.nonce, 6);
        assert!(agent.ledger().pending_snapshot().contains_key(&[7; 32]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_get_contiguous_nonces() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let agent = agent_on(&chain, 1, Arc::new(ManualTimeSource::new(0)));
        for _ in 0..20 {
            chain.push_outcome(ScriptedOutcome::Hold);
        }

        let handles: Vec<_> = (0..20u8)
            .map(|i| {
                let agent = agent.clone();
                tokio::spawn(async move { agent.send(call(i)).await.unwrap() })
            })
            .collect();

        let mut sent = Vec::new();
        for handle in handles {
            sent.push(handle.await.unwrap());
        }

        let mut nonces: Vec<_> = sent.iter().map(|s| s.nonce).collect();
        nonces.sort_unstable();
        assert_eq!(nonces, (0..20).collect::<Vec<_>>());
        assert_eq!(agent.ledger().pending_snapshot().len(), 20);

        // Receipts arrive in reverse order.
        for (block, tx) in sent.iter().rev().enumerate() {
            let receipt = TransactionReceipt {
                transaction_hash: tx.hash,
                block_number: block as u64 + 1,
                success: true,
            };
            assert!(chain.resolve_held(&tx.hash, BroadcastOutcome::Receipt(receipt)));
        }
        for tx in sent {
            assert!(matches!(
                tx.outcome().await,
                Ok(TransactionStatus::Confirmed { .. })
            ));
        }

        assert!(agent.ledger().pending_snapshot().is_empty());
        assert_eq!(agent.ledger().confirmed_snapshot().len(), 20);
        assert_eq!(agent.send(call(99)).await.unwrap().nonce, 20);
    }

    #[tokio::test]
    async fn test_rejected_nonce_is_refilled() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let agent = agent_on(&chain, 1, Arc::new(ManualTimeSource::new(0)));
        chain.push_outcome(ScriptedOutcome::Hold);
        chain.push_outcome(ScriptedOutcome::Hold);

        let first = agent.send(call(1)).await.unwrap();
        let second = agent.send(call(2)).await.unwrap();
        assert_eq!((first.nonce, second.nonce), (0, 1));

        chain.resolve_held(
            &second.hash,
            BroadcastOutcome::Error {
                message: "replacement transaction underpriced".into(),
                receipt: None,
            },
        );
        assert!(second.outcome().await.is_err());

        let third = agent.send(call(3)).await.unwrap();
        assert_eq!(third.nonce, 1);
    }

    #[tokio::test]
    async fn test_duplicate_broadcast_is_not_an_error() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let agent = agent_on(&chain, 1, Arc::new(ManualTimeSource::new(0)));
        chain.push_outcome(ScriptedOutcome::Error {
            message: "already known".into(),
            with_receipt: false,
        });

        let sent = agent.send(call(1)).await.unwrap();
        let pending_before = agent.ledger().pending_snapshot();

        assert_eq!(sent.outcome().await, Ok(TransactionStatus::Duplicate));
        assert_eq!(agent.ledger().pending_snapshot(), pending_before);
        assert!(agent.ledger().confirmed_snapshot().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_accounts_do_not_share_nonces() {
        let chain = Arc::new(InMemoryChain::new(1337));
        let time = Arc::new(ManualTimeSource::new(0));
        let alice = agent_on(&chain, 1, time.clone());
        let bob = agent_on(&chain, 2, time.clone());

        let (a, b) = tokio::join!(alice.send(call(1)), bob.send(call(2)));
        assert_eq!(a.unwrap().nonce, 0);
        assert_eq!(b.unwrap().nonce, 0);
    }
}
