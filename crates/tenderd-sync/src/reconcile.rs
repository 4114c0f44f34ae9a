//! Periodic reconciliation against the portal
//!
//! Walks every persisted tender sequentially, re-fetches the ones that still
//! miss lifecycle data, and applies fill-in-only updates. The status title is
//! the single exception: it always tracks the latest portal value. A failure
//! on one tender is logged and the batch continues; only tenders that were
//! actually written incur the throttling pause.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::time::interval;

use tenderd_core::models::Tender;
use tenderd_core::AppError;
use tenderd_db::{ParticipantRepository, TenderRepository};
use tenderd_source::dates::parse_portal_datetime;
use tenderd_source::model::{ParsedTender, CONTRACT_STATUS_SIGNED, STATUS_OFFERS_REVIEWED};
use tenderd_source::TenderSource;

use crate::ingest::QUALIFICATION_OFFSET_DAYS;

/// A tender is done once offers are reviewed and every lifecycle field is
/// known; anything else warrants a re-fetch.
pub fn needs_refresh(tender: &Tender) -> bool {
    tender.status_title.as_deref() != Some(STATUS_OFFERS_REVIEWED)
        || tender.auction_start.is_none()
        || tender.qualification_date.is_none()
        || tender.deal_id.is_none()
        || tender.deal_date.is_none()
        || tender.deal_amount.is_none()
        || tender.deal_url.is_none()
}

/// Merge a freshly fetched document into the tender. Returns whether anything
/// changed.
///
/// `participant_name` is the name of the tender's assigned participant; deal
/// fields are only filled when the portal's contract belongs to it and the
/// contract is signed.
pub fn apply_refresh(
    tender: &mut Tender,
    parsed: &ParsedTender,
    participant_name: Option<&str>,
) -> bool {
    let mut updated = false;

    // Status always tracks the portal, this is the one non-fill-only field.
    if tender.status_title != parsed.status_title {
        tender.status_title = parsed.status_title.clone();
        updated = true;
    }

    if tender.auction_start.is_none() {
        if let Some(start) = parsed
            .important_dates
            .as_ref()
            .and_then(|d| d.auction_start.as_deref())
            .and_then(parse_portal_datetime)
        {
            tender.auction_start = Some(start);
            updated = true;
        }
    }

    if tender.qualification_date.is_none() {
        if let Some(start) = parsed
            .awards
            .as_deref()
            .and_then(|a| a.first())
            .and_then(|a| a.complaint_period_start)
        {
            tender.qualification_date =
                Some(start + ChronoDuration::days(QUALIFICATION_OFFSET_DAYS));
            updated = true;
        }
    }

    let missing_deal_fields = tender.deal_id.is_none()
        || tender.deal_date.is_none()
        || tender.deal_amount.is_none()
        || tender.deal_url.is_none();

    if missing_deal_fields {
        if let Some(contract) = signed_contract_for(parsed, participant_name) {
            if let Some(document) = contract.documents.as_deref().and_then(|d| d.first()) {
                if tender.deal_id.is_none() {
                    if let Some(id) = document.id {
                        tender.deal_id = Some(id.to_string());
                        updated = true;
                    }
                }
                if tender.deal_date.is_none() {
                    if let Some(date) = document
                        .date_modified
                        .as_deref()
                        .and_then(parse_portal_datetime)
                    {
                        tender.deal_date = Some(date);
                        updated = true;
                    }
                }
                if tender.deal_amount.is_none() {
                    if let Some(amount) = contract.amount {
                        tender.deal_amount = Some(amount);
                        updated = true;
                    }
                }
                if tender.deal_url.is_none() {
                    if let Some(url) = &document.view_url {
                        tender.deal_url = Some(url.clone());
                        updated = true;
                    }
                }
            }
        }
    }

    updated
}

/// First contract of the first participant-contract block, but only when the
/// block's participant title contains the assigned participant's name and the
/// contract carries the portal's "signed" status.
fn signed_contract_for<'a>(
    parsed: &'a ParsedTender,
    participant_name: Option<&str>,
) -> Option<&'a tenderd_source::model::Contract> {
    let name = participant_name?;
    let block = parsed.participant_contracts.as_deref()?.first()?;
    if !block
        .participant_title
        .as_deref()
        .is_some_and(|title| title.contains(name))
    {
        return None;
    }
    let contract = block.contracts.as_deref()?.first()?;
    let signed = contract
        .status
        .as_ref()
        .and_then(|s| s.title.as_deref())
        .is_some_and(|title| title == CONTRACT_STATUS_SIGNED);
    signed.then_some(contract)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileSummary {
    pub scanned: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Background service running the reconciliation pass on a fixed interval.
pub struct ReconcileService {
    tenders: TenderRepository,
    participants: ParticipantRepository,
    source: Arc<dyn TenderSource>,
    run_interval: Duration,
    write_pause: Duration,
}

impl ReconcileService {
    pub fn new(
        tenders: TenderRepository,
        participants: ParticipantRepository,
        source: Arc<dyn TenderSource>,
        run_interval: Duration,
        write_pause: Duration,
    ) -> Self {
        Self {
            tenders,
            participants,
            source,
            run_interval,
            write_pause,
        }
    }

    /// Start the periodic task. Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(self.run_interval);
            // the first tick fires immediately; skip it so startup stays quiet
            tick.tick().await;

            loop {
                tick.tick().await;
                match self.run_once().await {
                    Ok(summary) => {
                        tracing::info!(
                            scanned = summary.scanned,
                            updated = summary.updated,
                            failed = summary.failed,
                            "Reconciliation pass completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reconciliation pass failed");
                    }
                }
            }
        })
    }

    /// One sequential pass over all tenders. Per-tender failures are counted
    /// and logged, never propagated.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<ReconcileSummary, AppError> {
        let ids = self.tenders.all_ids().await?;
        let mut summary = ReconcileSummary {
            scanned: ids.len(),
            ..Default::default()
        };

        for id in ids {
            match self.refresh_one(id).await {
                Ok(true) => {
                    summary.updated += 1;
                    // throttle writes against the portal across large batches
                    tokio::time::sleep(self.write_pause).await;
                }
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(tender_id = id, error = %e, "Skipping tender after reconcile failure");
                }
            }
        }

        Ok(summary)
    }

    async fn refresh_one(&self, id: i64) -> Result<bool, AppError> {
        let Some(mut tender) = self.tenders.get(id).await? else {
            return Ok(false);
        };
        if !needs_refresh(&tender) {
            return Ok(false);
        }

        let parsed = self
            .source
            .fetch_tender(id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        let Some(parsed) = parsed else {
            tracing::warn!(tender_id = id, "Portal no longer knows this tender");
            return Ok(false);
        };

        let participant_name = match tender.participant_id {
            Some(participant_id) => self.participants.name_of(participant_id).await?,
            None => None,
        };

        let updated = apply_refresh(&mut tender, &parsed, participant_name.as_deref());
        if updated {
            self.tenders.update_aggregate(&tender, None).await?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tenderd_source::model::{
        Award, Contract, ContractDocument, ContractStatus, ImportantDates, ParticipantContract,
    };

    fn dt(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn complete_tender() -> Tender {
        let mut tender = Tender::new(1, Some(1));
        tender.status_title = Some(STATUS_OFFERS_REVIEWED.to_string());
        tender.auction_start = Some(dt("2024-02-01T12:00:00"));
        tender.qualification_date = Some(dt("2024-02-05T00:00:00"));
        tender.deal_id = Some("991".to_string());
        tender.deal_date = Some(dt("2024-02-10T10:00:00"));
        tender.deal_amount = Some(100);
        tender.deal_url = Some("https://portal/doc/991".to_string());
        tender
    }

    fn signed_document() -> ParsedTender {
        ParsedTender {
            participant_contracts: Some(vec![ParticipantContract {
                participant_title: Some("ТОВ Будінвест (переможець)".to_string()),
                contracts: Some(vec![Contract {
                    status: Some(ContractStatus {
                        title: Some(CONTRACT_STATUS_SIGNED.to_string()),
                    }),
                    amount: Some(120000),
                    documents: Some(vec![ContractDocument {
                        id: Some(555),
                        date_modified: Some("10.02.2024 10:00".to_string()),
                        view_url: Some("https://portal/doc/555".to_string()),
                    }]),
                }]),
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn complete_tender_needs_no_refresh() {
        assert!(!needs_refresh(&complete_tender()));

        let mut missing_url = complete_tender();
        missing_url.deal_url = None;
        assert!(needs_refresh(&missing_url));

        let mut wrong_status = complete_tender();
        wrong_status.status_title = Some("Аукціон".to_string());
        assert!(needs_refresh(&wrong_status));
    }

    #[test]
    fn status_title_tracks_the_portal_unconditionally() {
        let mut tender = Tender::new(1, None);
        tender.status_title = Some("A".to_string());

        let parsed = ParsedTender {
            status_title: Some("B".to_string()),
            ..Default::default()
        };
        assert!(apply_refresh(&mut tender, &parsed, None));
        assert_eq!(tender.status_title.as_deref(), Some("B"));

        // unchanged status reports no update
        assert!(!apply_refresh(&mut tender, &parsed, None));
    }

    #[test]
    fn existing_deal_id_is_never_overwritten() {
        let mut tender = complete_tender();
        tender.status_title = None; // force a refresh-worthy tender

        let parsed = signed_document();
        apply_refresh(&mut tender, &parsed, Some("ТОВ Будінвест"));
        assert_eq!(tender.deal_id.as_deref(), Some("991"));
        assert_eq!(tender.deal_url.as_deref(), Some("https://portal/doc/991"));
    }

    #[test]
    fn deal_fields_fill_only_for_the_matching_signed_contract() {
        let mut tender = Tender::new(1, None);
        assert!(apply_refresh(
            &mut tender,
            &signed_document(),
            Some("ТОВ Будінвест")
        ));
        assert_eq!(tender.deal_id.as_deref(), Some("555"));
        assert_eq!(tender.deal_date, Some(dt("2024-02-10T10:00:00")));
        assert_eq!(tender.deal_amount, Some(120000));
        assert_eq!(tender.deal_url.as_deref(), Some("https://portal/doc/555"));
    }

    #[test]
    fn deal_fields_skip_on_participant_mismatch_or_unsigned() {
        let mut tender = Tender::new(1, None);
        apply_refresh(&mut tender, &signed_document(), Some("Інша Компанія"));
        assert!(tender.deal_id.is_none());

        let mut unsigned = signed_document();
        unsigned.participant_contracts.as_mut().unwrap()[0]
            .contracts
            .as_mut()
            .unwrap()[0]
            .status = Some(ContractStatus {
            title: Some("Проєкт".to_string()),
        });
        apply_refresh(&mut tender, &unsigned, Some("ТОВ Будінвест"));
        assert!(tender.deal_id.is_none());

        // without an assigned participant there is nothing to match against
        apply_refresh(&mut tender, &signed_document(), None);
        assert!(tender.deal_id.is_none());
    }

    #[test]
    fn malformed_deal_date_fills_the_siblings_anyway() {
        let mut tender = Tender::new(1, None);
        let mut parsed = signed_document();
        parsed.participant_contracts.as_mut().unwrap()[0]
            .contracts
            .as_mut()
            .unwrap()[0]
            .documents
            .as_mut()
            .unwrap()[0]
            .date_modified = Some("broken".to_string());

        assert!(apply_refresh(&mut tender, &parsed, Some("ТОВ Будінвест")));
        assert_eq!(tender.deal_id.as_deref(), Some("555"));
        assert!(tender.deal_date.is_none());
        assert_eq!(tender.deal_amount, Some(120000));
    }

    #[test]
    fn auction_start_and_qualification_fill_only_when_missing() {
        let mut tender = Tender::new(1, None);
        let parsed = ParsedTender {
            important_dates: Some(ImportantDates {
                auction_start: Some("01.02.2024 12:30".to_string()),
                ..Default::default()
            }),
            awards: Some(vec![Award {
                complaint_period_start: Some(dt("2024-01-01T00:00:00")),
                ..Default::default()
            }]),
            ..Default::default()
        };

        assert!(apply_refresh(&mut tender, &parsed, None));
        assert_eq!(tender.auction_start, Some(dt("2024-02-01T12:30:00")));
        assert_eq!(tender.qualification_date, Some(dt("2024-01-05T00:00:00")));

        // a second pass with different portal dates changes nothing
        let other = ParsedTender {
            important_dates: Some(ImportantDates {
                auction_start: Some("09.09.2024 09:00".to_string()),
                ..Default::default()
            }),
            awards: Some(vec![Award {
                complaint_period_start: Some(dt("2024-06-01T00:00:00")),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(!apply_refresh(&mut tender, &other, None));
        assert_eq!(tender.auction_start, Some(dt("2024-02-01T12:30:00")));
    }
}
