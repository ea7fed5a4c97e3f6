use crate::domain::account::Client;
use crate::domain::back_office::Loan;
use crate::domain::ports::{ClockRef, MutatorRef, StoreRef};
use crate::domain::specification::{Predicate, Specification, Value};
use crate::domain::transfer::{
    RESTRICTED_ACCOUNT_NUMBER, Transfer, TransferCategory, TransferFilter, TransferReceipt,
    TransferRequest, TransferType,
};
use crate::error::{BankError, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Moves money between accounts and keeps the double-entry ledger.
///
/// Every balance change goes through the [`AccountBalanceMutator`], which
/// writes the matching ledger entry in the same unit. A transfer to another
/// client of the bank is two such units: the sender's side commits first,
/// then the receiver's.
///
/// [`AccountBalanceMutator`]: crate::domain::ports::AccountBalanceMutator
pub struct TransferLedger {
    clients: StoreRef<Client>,
    transfers: StoreRef<Transfer>,
    mutator: MutatorRef,
    clock: ClockRef,
}

impl TransferLedger {
    pub fn new(
        clients: StoreRef<Client>,
        transfers: StoreRef<Transfer>,
        mutator: MutatorRef,
        clock: ClockRef,
    ) -> Self {
        Self {
            clients,
            transfers,
            mutator,
            clock,
        }
    }

    pub async fn list_transfers(&self) -> Result<Vec<Transfer>> {
        self.transfers.find_all(&Specification::new()).await
    }

    /// The client's ledger entries matching `filter`.
    pub async fn list_transfers_for_client(
        &self,
        client_id: u64,
        filter: &TransferFilter,
    ) -> Result<Vec<Transfer>> {
        let spec = Specification::new().add(Predicate::equal("client", Value::Id(client_id)));
        let mut transfers = self.transfers.find_all(&spec).await?;
        transfers.retain(|t| filter.accepts(t));
        Ok(transfers)
    }

    /// Changes a client's name without touching the balance.
    pub async fn rename_client(&self, client_id: u64, full_name: String) -> Result<Client> {
        let client = self.mutator.rename(client_id, full_name).await?;
        info!(client_id, "Client renamed");
        Ok(client)
    }

    /// Records a ledger entry without touching any balance.
    pub async fn add_transfer(&self, transfer: Transfer) -> Result<Transfer> {
        self.transfers.save(transfer).await
    }

    pub async fn delete_transfer(&self, transfer_id: u64) -> Result<()> {
        if !self.transfers.exists_by_id(transfer_id).await? {
            return Err(BankError::not_found("Transfer", transfer_id));
        }
        self.transfers.delete_by_id(transfer_id).await?;
        warn!(transfer_id, "Ledger entry removed");
        Ok(())
    }

    /// Pays the next rate of `loan` from its client's account.
    pub async fn execute_loan_rate_payment(&self, loan: &Loan) -> Result<Transfer> {
        let client = match loan.client {
            Some(client_id) => self.clients.find_by_id(client_id).await?,
            None => None,
        }
        .ok_or_else(|| {
            BankError::AccountUnavailable(format!("client of loan {} not available", loan.id))
        })?;

        if loan.rates_left_to_pay == 0 {
            return Err(BankError::ValidationError(format!(
                "Loan {} has no rates left to pay",
                loan.id
            )));
        }
        if !client.balance.covers(loan.rate_amount) {
            warn!(client_id = client.id, loan_id = loan.id, "Rate payment rejected");
            return Err(client.insufficient(loan.rate_amount));
        }

        let rate_number = loan.next_rate_number();
        let entry = Transfer {
            id: 0,
            amount: loan.rate_amount,
            date: self.clock.today(),
            category: TransferCategory::Bills,
            r#type: TransferType::Outgoing,
            counterparty_name: client.full_name.clone(),
            title: format!("Loan: {} | Rate number: {}", loan.id, rate_number),
            to_account_number: RESTRICTED_ACCOUNT_NUMBER.to_string(),
            client: client.id,
        };
        let (_, entry) = self.mutator.post(entry).await?;

        info!(
            client_id = client.id,
            loan_id = loan.id,
            rate_number,
            amount = %loan.rate_amount,
            "Loan rate paid"
        );
        Ok(entry)
    }

    /// Moves `request.amount` from the sender to the account numbered
    /// `request.to_account_number`.
    ///
    /// When no client of the bank holds that account number the money leaves
    /// the ledger and only the sender's entry is written.
    pub async fn execute_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let sender = self
            .clients
            .find_by_id(request.sender)
            .await?
            .ok_or_else(|| {
                BankError::AccountUnavailable(format!("sender {} not available", request.sender))
            })?;
        let receiver = self.find_by_account_number(&request.to_account_number).await?;

        if !sender.balance.covers(request.amount) {
            warn!(
                client_id = sender.id,
                amount = %request.amount,
                balance = %sender.balance,
                "Transfer rejected"
            );
            return Err(sender.insufficient(request.amount));
        }

        let today = self.clock.today();
        let outgoing = ledger_entry(
            &request,
            TransferType::Outgoing,
            &sender,
            request.to_account_number.clone(),
            sender.id,
            today,
        );
        let (_, outgoing) = self.mutator.post(outgoing).await?;

        let incoming = match receiver {
            Some(receiver) => {
                let incoming = ledger_entry(
                    &request,
                    TransferType::Incoming,
                    &sender,
                    receiver.account_number.clone(),
                    receiver.id,
                    today,
                );
                let (_, incoming) = self.mutator.post(incoming).await?;
                Some(incoming)
            }
            None => {
                debug!(
                    to_account = %request.to_account_number,
                    "Receiver is not held by this bank"
                );
                None
            }
        };

        info!(
            sender = sender.id,
            receiver = ?incoming.as_ref().map(|t| t.client),
            amount = %request.amount,
            "Transfer executed"
        );
        Ok(TransferReceipt { outgoing, incoming })
    }

    async fn find_by_account_number(&self, account_number: &str) -> Result<Option<Client>> {
        let spec = Specification::new().add(Predicate::equal("account_number", account_number));
        Ok(self.clients.find_all(&spec).await?.into_iter().next())
    }
}

/// One side of `request`, owned by `owner`. Both sides name the sender as
/// counterparty.
fn ledger_entry(
    request: &TransferRequest,
    direction: TransferType,
    sender: &Client,
    to_account_number: String,
    owner: u64,
    date: NaiveDate,
) -> Transfer {
    Transfer {
        id: 0,
        amount: request.amount,
        date,
        category: request.category,
        r#type: direction,
        counterparty_name: sender.full_name.clone(),
        title: request.title.clone(),
        to_account_number,
        client: owner,
    }
}
