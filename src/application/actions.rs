//! Domain actions behind accepted orders.
//!
//! Each order type maps to one small action type holding a shared
//! [`BackOffice`]. [`BackOffice::dispatch_table`] registers all of them.

use crate::application::dispatch::{DispatchTable, OrderAction};
use crate::application::ledger::TransferLedger;
use crate::domain::account::Client;
use crate::domain::back_office::{
    AppUser, CardReference, ClientDetails, CreditCard, Employee, Loan, LoanRate, UserCredentials,
};
use crate::domain::order::OrderType;
use crate::domain::ports::StoreRef;
use crate::domain::specification::{Predicate, Specification};
use crate::domain::transfer::TransferRequest;
use crate::error::{BankError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// The records and services order actions operate on.
pub struct BackOffice {
    pub users: StoreRef<AppUser>,
    pub clients: StoreRef<Client>,
    pub employees: StoreRef<Employee>,
    pub cards: StoreRef<CreditCard>,
    pub loans: StoreRef<Loan>,
    pub ledger: Arc<TransferLedger>,
}

impl BackOffice {
    /// A dispatch table with an action for every order type.
    pub fn dispatch_table(self: Arc<Self>) -> Result<DispatchTable> {
        let mut table = DispatchTable::new();
        table.register::<UserCredentials, _>(OrderType::CreateUser, CreateUser(self.clone()))?;
        table.register::<UserCredentials, _>(OrderType::ModifyUser, ModifyUser(self.clone()))?;
        table.register::<ClientDetails, _>(OrderType::EditClient, EditClient(self.clone()))?;
        table.register::<Employee, _>(OrderType::ModifyEmployee, ModifyEmployee(self.clone()))?;
        table.register::<CardReference, _>(
            OrderType::BlockCreditCard,
            SetCardActive {
                office: self.clone(),
                active: false,
            },
        )?;
        table.register::<CardReference, _>(
            OrderType::UnblockCreditCard,
            SetCardActive {
                office: self.clone(),
                active: true,
            },
        )?;
        table.register::<CardReference, _>(
            OrderType::DiscardCreditCard,
            DiscardCreditCard(self.clone()),
        )?;
        table.register::<CreditCard, _>(OrderType::CreateCreditCard, CreateCreditCard(self.clone()))?;
        table.register::<Loan, _>(OrderType::LoanApplication, CreateLoan(self.clone()))?;
        table.register::<TransferRequest, _>(OrderType::Transfer, ExecuteTransfer(self.clone()))?;
        table.register::<LoanRate, _>(OrderType::LoanRatePayment, PayLoanRate(self))?;
        Ok(table)
    }

    async fn require_client(&self, client_id: u64) -> Result<Client> {
        self.clients
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| BankError::not_found("Client", client_id))
    }

    async fn require_card(&self, card_id: u64) -> Result<CreditCard> {
        self.cards
            .find_by_id(card_id)
            .await?
            .ok_or_else(|| BankError::not_found("Credit card", card_id))
    }
}

pub struct CreateUser(Arc<BackOffice>);

#[async_trait]
impl OrderAction<UserCredentials> for CreateUser {
    async fn apply(&self, credentials: UserCredentials) -> Result<()> {
        let taken = Specification::new().add(Predicate::equal(
            "username",
            credentials.username.as_str(),
        ));
        if !self.0.users.find_all(&taken).await?.is_empty() {
            return Err(BankError::ValidationError(format!(
                "Username {} is already taken",
                credentials.username
            )));
        }
        let user = self
            .0
            .users
            .save(AppUser {
                id: 0,
                username: credentials.username,
                role: credentials.role,
            })
            .await?;
        info!(user_id = user.id, "User created");
        Ok(())
    }
}

pub struct ModifyUser(Arc<BackOffice>);

#[async_trait]
impl OrderAction<UserCredentials> for ModifyUser {
    async fn apply(&self, credentials: UserCredentials) -> Result<()> {
        let user_id = credentials.user_id.ok_or_else(|| {
            BankError::ValidationError("User modification requires a user id".to_string())
        })?;
        let mut user = self
            .0
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BankError::not_found("User", user_id))?;
        user.username = credentials.username;
        user.role = credentials.role;
        self.0.users.save(user).await?;
        Ok(())
    }
}

pub struct EditClient(Arc<BackOffice>);

#[async_trait]
impl OrderAction<ClientDetails> for EditClient {
    async fn apply(&self, details: ClientDetails) -> Result<()> {
        self.0
            .ledger
            .rename_client(details.client_id, details.full_name)
            .await?;
        Ok(())
    }
}

pub struct ModifyEmployee(Arc<BackOffice>);

#[async_trait]
impl OrderAction<Employee> for ModifyEmployee {
    async fn apply(&self, employee: Employee) -> Result<()> {
        if !self.0.employees.exists_by_id(employee.id).await? {
            return Err(BankError::not_found("Employee", employee.id));
        }
        self.0.employees.save(employee).await?;
        Ok(())
    }
}

pub struct SetCardActive {
    office: Arc<BackOffice>,
    active: bool,
}

#[async_trait]
impl OrderAction<CardReference> for SetCardActive {
    async fn apply(&self, reference: CardReference) -> Result<()> {
        let mut card = self.office.require_card(reference.card_id).await?;
        card.active = self.active;
        self.office.cards.save(card).await?;
        info!(card_id = reference.card_id, active = self.active, "Credit card state changed");
        Ok(())
    }
}

pub struct DiscardCreditCard(Arc<BackOffice>);

#[async_trait]
impl OrderAction<CardReference> for DiscardCreditCard {
    async fn apply(&self, reference: CardReference) -> Result<()> {
        self.0.require_card(reference.card_id).await?;
        self.0.cards.delete_by_id(reference.card_id).await
    }
}

pub struct CreateCreditCard(Arc<BackOffice>);

#[async_trait]
impl OrderAction<CreditCard> for CreateCreditCard {
    async fn apply(&self, mut card: CreditCard) -> Result<()> {
        self.0.require_client(card.client).await?;
        card.id = 0;
        card.active = true;
        self.0.cards.save(card).await?;
        Ok(())
    }
}

pub struct CreateLoan(Arc<BackOffice>);

#[async_trait]
impl OrderAction<Loan> for CreateLoan {
    async fn apply(&self, mut loan: Loan) -> Result<()> {
        let client_id = loan.client.ok_or_else(|| {
            BankError::ValidationError("A loan application needs a client".to_string())
        })?;
        self.0.require_client(client_id).await?;
        if loan.rates_left_to_pay > loan.num_of_rates {
            return Err(BankError::ValidationError(
                "A loan can't have more rates left than it has in total".to_string(),
            ));
        }
        loan.id = 0;
        let loan = self.0.loans.save(loan).await?;
        info!(loan_id = loan.id, client_id, "Loan created");
        Ok(())
    }
}

pub struct ExecuteTransfer(Arc<BackOffice>);

#[async_trait]
impl OrderAction<TransferRequest> for ExecuteTransfer {
    async fn apply(&self, request: TransferRequest) -> Result<()> {
        self.0.ledger.execute_transfer(request).await?;
        Ok(())
    }
}

pub struct PayLoanRate(Arc<BackOffice>);

#[async_trait]
impl OrderAction<LoanRate> for PayLoanRate {
    async fn apply(&self, rate: LoanRate) -> Result<()> {
        let loan = self
            .0
            .loans
            .find_by_id(rate.loan_id)
            .await?
            .ok_or_else(|| BankError::not_found("Loan", rate.loan_id))?;
        let rates_left_to_pay = loan.rates_left_to_pay.checked_sub(1).ok_or_else(|| {
            BankError::ValidationError(format!("Loan {} has no rates left to pay", loan.id))
        })?;

        // The rate is reserved before it is paid and released if the payment fails.
        self.0
            .loans
            .save(Loan {
                rates_left_to_pay,
                ..loan.clone()
            })
            .await?;
        if let Err(e) = self.0.ledger.execute_loan_rate_payment(&loan).await {
            self.0.loans.save(loan).await?;
            return Err(e);
        }
        Ok(())
    }
}
