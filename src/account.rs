//! The consolidated account: an append-only cash ledger shared by all projects in a portfolio.
use crate::units::Money;
use log::info;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Whether money is coming in or going out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionType {
    /// Money received
    Income,
    /// Money paid out
    Expenditure,
}

/// A transaction to be posted to the account
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Income or expenditure
    pub kind: TransactionType,
    /// What the transaction is for
    pub title: String,
    /// The project (or other party) responsible
    pub project: String,
    /// The unsigned amount
    pub amount: Money,
}

impl Transaction {
    /// A new income transaction
    pub fn income(title: impl Into<String>, project: impl Into<String>, amount: Money) -> Self {
        Self {
            kind: TransactionType::Income,
            title: title.into(),
            project: project.into(),
            amount,
        }
    }

    /// A new expenditure transaction
    pub fn expenditure(
        title: impl Into<String>,
        project: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            kind: TransactionType::Expenditure,
            title: title.into(),
            project: project.into(),
            amount,
        }
    }
}

/// A transaction as recorded in the register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Income or expenditure
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// What the transaction is for
    pub title: String,
    /// The project (or other party) responsible
    pub project: String,
    /// The amount, negated for income so that the column sums to the net outflow
    pub amount: Money,
    /// The portfolio step at which the transaction was posted
    pub step: u32,
    /// The account balance after this transaction
    pub balance: Money,
}

/// Running totals and register of every transaction in a portfolio
#[derive(Debug, Default)]
pub struct ConsolidatedAccount {
    now: u32,
    total_payments: Money,
    total_income: Money,
    balance: Money,
    register: Vec<TransactionRecord>,
}

impl ConsolidatedAccount {
    /// Create an empty account
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step with which subsequent transactions are stamped
    pub fn set_step(&mut self, step: u32) {
        self.now = step;
    }

    /// Post a transaction.
    ///
    /// The running totals track unsigned amounts; the register stores income as a negative amount.
    pub fn update(&mut self, transaction: Transaction) -> &TransactionRecord {
        let amount = match transaction.kind {
            TransactionType::Expenditure => {
                self.total_payments += transaction.amount;
                transaction.amount
            }
            TransactionType::Income => {
                self.total_income += transaction.amount;
                -transaction.amount
            }
        };
        self.balance = self.total_income - self.total_payments;

        let index = self.register.len();
        self.register.push(TransactionRecord {
            kind: transaction.kind,
            title: transaction.title,
            project: transaction.project,
            amount,
            step: self.now,
            balance: self.balance,
        });
        &self.register[index]
    }

    /// The step with which transactions are currently stamped
    pub fn step(&self) -> u32 {
        self.now
    }

    /// Income minus payments to date
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Total income to date
    pub fn total_income(&self) -> Money {
        self.total_income
    }

    /// Total payments to date
    pub fn total_payments(&self) -> Money {
        self.total_payments
    }

    /// Every transaction posted, in order
    pub fn register(&self) -> &[TransactionRecord] {
        &self.register
    }

    /// Log a summary of the account
    pub fn report(&self) {
        info!(
            "Consolidated Account Report: Payments to date: {:.2}, Income to date: {:.2}, Balance: {:.2}",
            self.total_payments.0, self.total_income.0, self.balance.0
        );
    }
}
