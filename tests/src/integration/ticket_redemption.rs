//! # Ticket Redemption Flows
//!
//! A sender issues tickets, the next hop checks them against its secret
//! chain, and winning tickets are redeemed through the hop's account agent.
//!
//! ```text
//! sender ──TicketBuilder──→ SignedTicket ──wire──→ hop
//!                                                  │
//!                           ProofOfRelayChain::check_ticket
//!                                                  │ won
//!                           AccountAgent::send(redeem call)
//! ```

#[cfg(test)]
mod tests {
    use super::super::fixtures::{setup, InMemoryAccountIndex};
    use primitive_types::U256;
    use rs_01_proof_of_relay::{
        AcknowledgedTicket, HashedSecretChain, ProofOfRelayApi, ProofOfRelayChain, SignedTicket,
        TicketBuilder, TicketParams,
    };
    use rs_02_account_agent::{
        AccountAgent, AccountApi, AgentConfig, ChainPorts, InMemoryChain, TransactionStatus,
        TransactionTemplate,
    };
    use shared_crypto::{keccak256, Secp256k1KeyPair};
    use shared_types::{AccountId, Hash, ManualTimeSource};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CHANNELS_CONTRACT: [u8; 20] = [0xC0; 20];

    struct Hop {
        agent: AccountAgent,
        por: ProofOfRelayChain<InMemoryAccountIndex>,
        index: Arc<InMemoryAccountIndex>,
        chain: Arc<InMemoryChain>,
    }

    fn hop(chain_length: u64) -> Hop {
        setup();
        let keypair = Secp256k1KeyPair::from_bytes([0x0B; 32]).unwrap();
        let account = AccountId::new(keypair.address());
        let chain = Arc::new(InMemoryChain::new(1337));
        let index = Arc::new(InMemoryAccountIndex::default());

        let secrets = HashedSecretChain::new([0x5E; 32], chain_length);
        index.commit_secret(account, secrets.initial_commitment());

        Hop {
            agent: AccountAgent::new(
                keypair,
                AgentConfig::default(),
                ChainPorts::in_memory(chain.clone()),
                Arc::new(ManualTimeSource::new(0)),
            ),
            por: ProofOfRelayChain::new(account, secrets, index.clone()),
            index,
            chain,
        }
    }

    /// Ticket from the sender as it arrives over the wire.
    fn incoming(receiver: AccountId, counter: u64, percent: &str) -> AcknowledgedTicket {
        let sender = Secp256k1KeyPair::from_bytes([0x0A; 32]).unwrap();
        let params = TicketParams::new(
            receiver.0,
            format!("secret-{counter}").into_bytes(),
            U256::from(100u64),
            counter,
            percent,
        );
        let issued = TicketBuilder::new(&sender).build(&params).unwrap();

        let on_wire = SignedTicket::from_wire(
            issued.signed.ticket().clone(),
            *issued.signed.signature(),
        )
        .unwrap();
        assert_eq!(on_wire.recover_signer().unwrap(), sender.address());

        AcknowledgedTicket::new(on_wire, keccak256(&counter.to_be_bytes()))
    }

    fn redeem_call(ticket: &AcknowledgedTicket, pre_image: Hash) -> TransactionTemplate {
        let mut data = ticket.signed_ticket.encoded().to_vec();
        data.extend_from_slice(&pre_image);
        data.extend_from_slice(&ticket.response);
        TransactionTemplate::call(CHANNELS_CONTRACT, data)
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_winning_ticket_is_redeemed() {
        let hop = hop(8);
        let mut ticket = incoming(hop.agent.account(), 1, "100");

        let verdict = hop.por.check_ticket(&mut ticket).await.unwrap();
        assert!(verdict.won);
        let pre_image = ticket.pre_image.unwrap();

        let sent = hop.agent.send(redeem_call(&ticket, pre_image)).await.unwrap();
        assert!(matches!(
            sent.outcome().await,
            Ok(TransactionStatus::Confirmed { .. })
        ));

        let submitted = hop.chain.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].from, hop.agent.account().0);

        let metrics = settlement_telemetry::encode_metrics().unwrap();
        assert!(metrics.contains("rs_por_tickets_won_total"));
        assert!(metrics.contains("rs_account_transactions_sent_total"));
    }

    #[tokio::test]
    async fn test_each_win_reveals_the_next_link() {
        let hop = hop(8);
        let committed = hop.por.committed_secret().await.unwrap().unwrap();

        let mut first = incoming(hop.agent.account(), 1, "100");
        let mut second = incoming(hop.agent.account(), 2, "100");
        hop.por.check_ticket(&mut first).await.unwrap();
        hop.por.check_ticket(&mut second).await.unwrap();

        let first_pre_image = first.pre_image.unwrap();
        let second_pre_image = second.pre_image.unwrap();
        assert_eq!(keccak256(&first_pre_image), committed);
        assert_eq!(keccak256(&second_pre_image), first_pre_image);
    }

    #[tokio::test]
    async fn test_losing_tickets_are_not_redeemed() {
        let hop = hop(8);

        for counter in 1..=5 {
            let mut ticket = incoming(hop.agent.account(), counter, "0");
            let verdict = hop.por.check_ticket(&mut ticket).await.unwrap();
            assert!(!verdict.won);
            assert_eq!(verdict.iteration, 7);
        }
        assert!(hop.chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_rotated_on_chain() {
        let hop = hop(1);
        let account = hop.agent.account();
        assert_eq!(hop.por.ticket_epoch().await.unwrap(), 1);

        let mut ticket = incoming(account, 1, "100");
        let verdict = hop.por.check_ticket(&mut ticket).await.unwrap();
        assert!(verdict.rotation_needed);

        // Publish a fresh commitment through the agent.
        let commitment = hop
            .por
            .rotate_secret(HashedSecretChain::new([0x6F; 32], 4))
            .await;
        let sent = hop
            .agent
            .send(TransactionTemplate::call(CHANNELS_CONTRACT, commitment.to_vec()))
            .await
            .unwrap();
        assert!(sent.outcome().await.is_ok());

        // Once indexed, the new secret is picked up without a local update.
        hop.index.commit_secret(account, commitment);
        assert_eq!(hop.por.ticket_epoch().await.unwrap(), 2);

        let mut next = incoming(account, 2, "100");
        let verdict = hop.por.check_ticket(&mut next).await.unwrap();
        assert!(verdict.won);
        assert_eq!(verdict.iteration, 3);
        assert_eq!(keccak256(&next.pre_image.unwrap()), commitment);
    }
}
