use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::job::{Bid, Job};
use crate::utils::token::generate_contract_number;

text_enum!(ContractStatus {
    Draft => "draft",
    PendingSignature => "pending-signature",
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
    Terminated => "terminated",
});

impl ContractStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContractStatus::Completed | ContractStatus::Cancelled | ContractStatus::Terminated
        )
    }
}

text_enum!(ContractType {
    ProjectBased => "project-based",
    Hourly => "hourly",
    Retainer => "retainer",
    FixedTerm => "fixed-term",
});

text_enum!(PaymentStructure {
    Milestone => "milestone",
    Upfront => "upfront",
    Completion => "completion",
    Hourly => "hourly",
});

text_enum!(MilestoneStatus {
    Pending => "pending",
    Due => "due",
    Paid => "paid",
    Disputed => "disputed",
});

text_enum!(ReleaseStatus {
    Pending => "pending",
    Released => "released",
    Failed => "failed",
});

text_enum!(DisputeStatus {
    Pending => "pending",
    UnderReview => "under-review",
    Resolved => "resolved",
    Escalated => "escalated",
});

impl DisputeStatus {
    pub fn can_transition_to(&self, next: DisputeStatus) -> bool {
        use DisputeStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview) | (UnderReview, Resolved) | (UnderReview, Escalated)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractParty {
    Client,
    Professional,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractTimeline {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractScope {
    pub description: String,
    pub deliverables: Vec<String>,
    pub timeline: ContractTimeline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub status: MilestoneStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financial {
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_structure: PaymentStructure,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowRelease {
    pub id: Uuid,
    pub milestone: Option<Uuid>,
    pub amount: Decimal,
    pub status: ReleaseStatus,
    pub requested_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: Uuid,
    pub raised_by: Uuid,
    pub reason: String,
    pub milestone: Option<Uuid>,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Escrow {
    pub enabled: bool,
    pub total_held: Decimal,
    pub releases: Vec<EscrowRelease>,
    pub disputes: Vec<Dispute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signatures {
    pub client: Signature,
    pub professional: Signature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: Uuid,
    pub author: Uuid,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: String,
    pub actor: Uuid,
    pub at: DateTime<Utc>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub contract_number: String,
    pub job: Option<Uuid>,
    pub bid: Option<Uuid>,
    pub client: Uuid,
    pub professional: Uuid,
    pub title: String,
    pub contract_type: ContractType,
    pub scope: ContractScope,
    pub financial: Financial,
    pub escrow: Escrow,
    pub signatures: Signatures,
    pub communications: Vec<Communication>,
    pub audit_trail: Vec<AuditEntry>,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewContract {
    pub job: Option<Uuid>,
    pub client: Uuid,
    pub professional: Uuid,
    pub title: String,
    pub contract_type: ContractType,
    pub scope: ContractScope,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_structure: PaymentStructure,
    pub escrow_enabled: bool,
}

pub struct NewMilestone {
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
}

impl Contract {
    pub fn new(draft: NewContract, now: DateTime<Utc>) -> Result<Self> {
        if draft.client == draft.professional {
            return Err(Error::BadRequest(
                "Client and professional must be different users".into(),
            ));
        }
        let mut contract = Self {
            id: Uuid::new_v4(),
            contract_number: generate_contract_number(now),
            job: draft.job,
            bid: None,
            client: draft.client,
            professional: draft.professional,
            title: draft.title,
            contract_type: draft.contract_type,
            scope: draft.scope,
            financial: Financial {
                total_amount: draft.total_amount,
                currency: draft.currency,
                payment_structure: draft.payment_structure,
                milestones: Vec::new(),
            },
            escrow: Escrow {
                enabled: draft.escrow_enabled,
                ..Escrow::default()
            },
            signatures: Signatures::default(),
            communications: Vec::new(),
            audit_trail: Vec::new(),
            status: ContractStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        contract.record("created", draft.client, None, now);
        Ok(contract)
    }

    /// Builds the contract for a bid that has just been accepted. Expects the
    /// job and bid as they stand after [`Job::accept_bid`].
    pub fn from_accepted_bid(job: &Job, bid: &Bid, now: DateTime<Utc>) -> Self {
        let mut contract = Self {
            id: Uuid::new_v4(),
            contract_number: generate_contract_number(now),
            job: Some(job.id),
            bid: Some(bid.id),
            client: job.posted_by,
            professional: bid.bidder,
            title: format!("{} - Contract", job.title),
            contract_type: ContractType::ProjectBased,
            scope: ContractScope {
                description: job.description.clone(),
                deliverables: Vec::new(),
                timeline: ContractTimeline {
                    start_date: job.timeline.start_date,
                    end_date: job.timeline.end_date,
                },
            },
            financial: Financial {
                total_amount: bid.amount,
                currency: bid.currency.clone(),
                payment_structure: PaymentStructure::Milestone,
                milestones: Vec::new(),
            },
            escrow: Escrow {
                enabled: true,
                ..Escrow::default()
            },
            signatures: Signatures::default(),
            communications: Vec::new(),
            audit_trail: Vec::new(),
            status: ContractStatus::PendingSignature,
            created_at: now,
            updated_at: now,
        };
        contract.record(
            "created_from_bid",
            job.posted_by,
            Some(format!("bid {} for {}", bid.id, bid.amount)),
            now,
        );
        contract
    }

    /// Sum of paid milestones. Always recomputed.
    pub fn get_total_paid(&self) -> Decimal {
        self.financial
            .milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Paid)
            .map(|m| m.amount)
            .sum()
    }

    pub fn get_remaining_amount(&self) -> Decimal {
        self.financial.total_amount - self.get_total_paid()
    }

    pub fn milestones_total(&self) -> Decimal {
        self.financial.milestones.iter().map(|m| m.amount).sum()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.client.signed && self.signatures.professional.signed
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if self.status != ContractStatus::Active {
            return false;
        }
        let late_milestone = self.financial.milestones.iter().any(|m| {
            m.status != MilestoneStatus::Paid && m.due_date.map(|d| d < now).unwrap_or(false)
        });
        let past_end = self
            .scope
            .timeline
            .end_date
            .map(|end| end < now)
            .unwrap_or(false);
        late_milestone || past_end
    }

    pub fn party_of(&self, user: Uuid) -> Option<ContractParty> {
        if user == self.client {
            Some(ContractParty::Client)
        } else if user == self.professional {
            Some(ContractParty::Professional)
        } else {
            None
        }
    }

    pub fn require_party(&self, user: Uuid) -> Result<ContractParty> {
        self.party_of(user)
            .ok_or_else(|| Error::Forbidden("You are not a party to this contract".into()))
    }

    fn require_client(&self, user: Uuid) -> Result<()> {
        match self.require_party(user)? {
            ContractParty::Client => Ok(()),
            ContractParty::Professional => Err(Error::Forbidden(
                "Only the client can perform this action".into(),
            )),
        }
    }

    fn require_open(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::Conflict(format!("Contract is {}", self.status)));
        }
        Ok(())
    }

    fn record(&mut self, action: &str, actor: Uuid, details: Option<String>, now: DateTime<Utc>) {
        self.audit_trail.push(AuditEntry {
            action: action.to_string(),
            actor,
            at: now,
            details,
        });
        self.updated_at = now;
    }

    pub fn sign(&mut self, actor: Uuid, now: DateTime<Utc>) -> Result<()> {
        let party = self.require_party(actor)?;
        if !matches!(
            self.status,
            ContractStatus::Draft | ContractStatus::PendingSignature
        ) {
            return Err(Error::Conflict(format!(
                "Contract cannot be signed while {}",
                self.status
            )));
        }
        let signature = match party {
            ContractParty::Client => &mut self.signatures.client,
            ContractParty::Professional => &mut self.signatures.professional,
        };
        if signature.signed {
            return Err(Error::Conflict("You have already signed this contract".into()));
        }
        signature.signed = true;
        signature.signed_at = Some(now);
        self.record("signed", actor, None, now);

        self.status = if self.is_fully_signed() {
            ContractStatus::Active
        } else {
            ContractStatus::PendingSignature
        };
        if self.status == ContractStatus::Active {
            self.record("activated", actor, None, now);
        }
        Ok(())
    }

    pub fn add_milestone(
        &mut self,
        actor: Uuid,
        milestone: NewMilestone,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        self.require_client(actor)?;
        self.require_open()?;
        if milestone.amount <= Decimal::ZERO {
            return Err(Error::BadRequest("Milestone amount must be positive".into()));
        }
        if self.milestones_total() + milestone.amount > self.financial.total_amount {
            return Err(Error::Conflict(
                "Milestones would exceed the contract total".into(),
            ));
        }
        let id = Uuid::new_v4();
        let details = format!("{} ({})", milestone.title, milestone.amount);
        self.financial.milestones.push(Milestone {
            id,
            title: milestone.title,
            description: milestone.description,
            amount: milestone.amount,
            due_date: milestone.due_date,
            status: MilestoneStatus::Pending,
            paid_at: None,
        });
        self.record("milestone_added", actor, Some(details), now);
        Ok(id)
    }

    pub fn update_milestone(
        &mut self,
        actor: Uuid,
        milestone_id: Uuid,
        next: MilestoneStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let party = self.require_party(actor)?;
        self.require_open()?;
        let index = self
            .financial
            .milestones
            .iter()
            .position(|m| m.id == milestone_id)
            .ok_or_else(|| Error::NotFound("Milestone not found".into()))?;
        let current = self.financial.milestones[index].status;
        let amount = self.financial.milestones[index].amount;

        match (current, next) {
            (MilestoneStatus::Pending, MilestoneStatus::Due) => {}
            (MilestoneStatus::Due, MilestoneStatus::Paid) => {
                if party != ContractParty::Client {
                    return Err(Error::Forbidden(
                        "Only the client can mark a milestone as paid".into(),
                    ));
                }
                if self.status != ContractStatus::Active {
                    return Err(Error::Conflict(
                        "Payments require an active contract".into(),
                    ));
                }
                if self.escrow.enabled {
                    if self.escrow.total_held < amount {
                        return Err(Error::Conflict(
                            "Insufficient funds held in escrow".into(),
                        ));
                    }
                    self.escrow.total_held -= amount;
                    self.escrow.releases.push(EscrowRelease {
                        id: Uuid::new_v4(),
                        milestone: Some(milestone_id),
                        amount,
                        status: ReleaseStatus::Released,
                        requested_by: actor,
                        created_at: now,
                        released_at: Some(now),
                    });
                }
                self.financial.milestones[index].paid_at = Some(now);
            }
            (MilestoneStatus::Due, MilestoneStatus::Disputed) => {
                let reason = reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| Error::BadRequest("A dispute reason is required".into()))?;
                self.escrow.disputes.push(Dispute {
                    id: Uuid::new_v4(),
                    raised_by: actor,
                    reason,
                    milestone: Some(milestone_id),
                    status: DisputeStatus::Pending,
                    resolution: None,
                    created_at: now,
                    resolved_at: None,
                });
            }
            (from, to) => {
                return Err(Error::Conflict(format!(
                    "Cannot move milestone from {} to {}",
                    from, to
                )));
            }
        }

        self.financial.milestones[index].status = next;
        self.record(
            "milestone_updated",
            actor,
            Some(format!("{} -> {}", current, next)),
            now,
        );
        Ok(())
    }

    pub fn fund_escrow(&mut self, actor: Uuid, amount: Decimal, now: DateTime<Utc>) -> Result<()> {
        self.require_client(actor)?;
        self.require_open()?;
        if !self.escrow.enabled {
            return Err(Error::Conflict("Escrow is not enabled for this contract".into()));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::BadRequest("Escrow amount must be positive".into()));
        }
        if self.escrow.total_held + amount > self.get_remaining_amount() {
            return Err(Error::Conflict(
                "Escrow cannot hold more than the remaining contract amount".into(),
            ));
        }
        self.escrow.total_held += amount;
        self.record("escrow_funded", actor, Some(amount.to_string()), now);
        Ok(())
    }

    pub fn raise_dispute(
        &mut self,
        actor: Uuid,
        reason: String,
        milestone: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        self.require_party(actor)?;
        self.require_open()?;
        if let Some(milestone_id) = milestone {
            let target = self
                .financial
                .milestones
                .iter_mut()
                .find(|m| m.id == milestone_id)
                .ok_or_else(|| Error::NotFound("Milestone not found".into()))?;
            if target.status != MilestoneStatus::Due {
                return Err(Error::Conflict(format!(
                    "Only due milestones can be disputed, this one is {}",
                    target.status
                )));
            }
            target.status = MilestoneStatus::Disputed;
        }
        let id = Uuid::new_v4();
        self.escrow.disputes.push(Dispute {
            id,
            raised_by: actor,
            reason,
            milestone,
            status: DisputeStatus::Pending,
            resolution: None,
            created_at: now,
            resolved_at: None,
        });
        self.record("dispute_raised", actor, Some(id.to_string()), now);
        Ok(id)
    }

    pub fn update_dispute(
        &mut self,
        actor: Uuid,
        dispute_id: Uuid,
        next: DisputeStatus,
        resolution: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_party(actor)?;
        self.require_open()?;
        let dispute = self
            .escrow
            .disputes
            .iter_mut()
            .find(|d| d.id == dispute_id)
            .ok_or_else(|| Error::NotFound("Dispute not found".into()))?;
        if !dispute.status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "Cannot move dispute from {} to {}",
                dispute.status, next
            )));
        }
        let from = dispute.status;
        dispute.status = next;
        if next == DisputeStatus::Resolved {
            dispute.resolution = resolution;
            dispute.resolved_at = Some(now);
        }
        let milestone = dispute.milestone;

        if next == DisputeStatus::Resolved {
            if let Some(milestone_id) = milestone {
                if let Some(target) = self
                    .financial
                    .milestones
                    .iter_mut()
                    .find(|m| m.id == milestone_id && m.status == MilestoneStatus::Disputed)
                {
                    target.status = MilestoneStatus::Due;
                }
            }
        }
        self.record(
            "dispute_updated",
            actor,
            Some(format!("{}: {} -> {}", dispute_id, from, next)),
            now,
        );
        Ok(())
    }

    pub fn post_message(&mut self, actor: Uuid, message: String, now: DateTime<Utc>) -> Result<Uuid> {
        self.require_party(actor)?;
        let id = Uuid::new_v4();
        self.communications.push(Communication {
            id,
            author: actor,
            message,
            sent_at: now,
        });
        self.record("message_posted", actor, Some(id.to_string()), now);
        Ok(id)
    }

    pub fn transition_to(&mut self, actor: Uuid, next: ContractStatus, now: DateTime<Utc>) -> Result<()> {
        let party = self.require_party(actor)?;
        self.require_open()?;
        match next {
            ContractStatus::Completed => {
                if party != ContractParty::Client {
                    return Err(Error::Forbidden(
                        "Only the client can complete a contract".into(),
                    ));
                }
                if self.status != ContractStatus::Active {
                    return Err(Error::Conflict("Only active contracts can be completed".into()));
                }
                if self
                    .financial
                    .milestones
                    .iter()
                    .any(|m| m.status != MilestoneStatus::Paid)
                {
                    return Err(Error::Conflict(
                        "All milestones must be paid before completion".into(),
                    ));
                }
            }
            ContractStatus::Cancelled => {
                if self.status == ContractStatus::Active {
                    return Err(Error::Conflict(
                        "Active contracts must be terminated, not cancelled".into(),
                    ));
                }
            }
            ContractStatus::Terminated => {
                if self.status != ContractStatus::Active {
                    return Err(Error::Conflict("Only active contracts can be terminated".into()));
                }
            }
            other => {
                return Err(Error::Conflict(format!(
                    "Contract status {} cannot be set directly",
                    other
                )));
            }
        }
        let from = self.status;
        self.status = next;
        self.record("status_changed", actor, Some(format!("{} -> {}", from, next)), now);
        Ok(())
    }
}
