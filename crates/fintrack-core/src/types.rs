//! Enumerated value sets shared by transaction records, filters and reports

use serde::{Deserialize, Serialize};

/// Transaction type: the discriminant of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

/// Declares a closed set of display labels with lookup and serde support.
/// Lookup ignores ASCII case and surrounding whitespace.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident ($noun:literal) { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            /// Every member, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("Invalid {}: {}", $noun, s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum! {
    /// Categories an income record may carry
    IncomeCategory ("income category") {
        Salary => "Salary",
        Freelance => "Freelance",
        Business => "Business",
        Investments => "Investments",
        Rental => "Rental",
        Gifts => "Gifts",
        Refunds => "Refunds",
        OtherIncome => "Other Income",
    }
}

labelled_enum! {
    /// Categories an expense record may carry
    ExpenseCategory ("expense category") {
        FoodAndDining => "Food & Dining",
        Groceries => "Groceries",
        Transportation => "Transportation",
        Shopping => "Shopping",
        Entertainment => "Entertainment",
        BillsAndUtilities => "Bills & Utilities",
        Rent => "Rent",
        Healthcare => "Healthcare",
        Education => "Education",
        Travel => "Travel",
        Insurance => "Insurance",
        PersonalCare => "Personal Care",
        GiftsAndDonations => "Gifts & Donations",
        OtherExpense => "Other Expense",
    }
}

labelled_enum! {
    /// How an expense was paid
    PaymentMethod ("payment method") {
        Cash => "Cash",
        CreditCard => "Credit Card",
        DebitCard => "Debit Card",
        Upi => "UPI",
        NetBanking => "Net Banking",
        Wallet => "Wallet",
        BankTransfer => "Bank Transfer",
        Other => "Other",
    }
}

labelled_enum! {
    /// Repeat interval of a recurring record
    RecurringFrequency ("recurring frequency") {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

labelled_enum! {
    /// Grouping dimension for stats
    GroupBy ("group") {
        Category => "category",
        Month => "month",
    }
}

impl Default for GroupBy {
    fn default() -> Self {
        GroupBy::Category
    }
}

/// A category from either set. The two sets are disjoint, so a label
/// alone determines which transaction type it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Income(IncomeCategory),
    Expense(ExpenseCategory),
}

impl Category {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Category::Income(_) => TransactionType::Income,
            Category::Expense(_) => TransactionType::Expense,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Income(c) => c.label(),
            Category::Expense(c) => c.label(),
        }
    }

    /// Parse a label restricted to the set belonging to `transaction_type`
    pub fn parse_for(transaction_type: TransactionType, s: &str) -> Result<Self, String> {
        match transaction_type {
            TransactionType::Income => s.parse().map(Category::Income),
            TransactionType::Expense => s.parse().map(Category::Expense),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IncomeCategory>()
            .map(Category::Income)
            .or_else(|_| s.parse::<ExpenseCategory>().map(Category::Expense))
            .map_err(|_| format!("Invalid category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!(" Expense ".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for c in ExpenseCategory::ALL {
            assert_eq!(c.label().parse::<ExpenseCategory>().unwrap(), *c);
        }
        assert_eq!("food & dining".parse::<ExpenseCategory>().unwrap(), ExpenseCategory::FoodAndDining);
        assert_eq!("upi".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
    }

    #[test]
    fn test_category_sets_are_disjoint() {
        let income: HashSet<String> = IncomeCategory::ALL
            .iter()
            .map(|c| c.label().to_lowercase())
            .collect();
        for c in ExpenseCategory::ALL {
            assert!(!income.contains(&c.label().to_lowercase()), "{} in both sets", c);
        }
    }

    #[test]
    fn test_category_resolves_type() {
        let c: Category = "Salary".parse().unwrap();
        assert_eq!(c.transaction_type(), TransactionType::Income);
        let c: Category = "Rent".parse().unwrap();
        assert_eq!(c.transaction_type(), TransactionType::Expense);
        assert!("Lottery".parse::<Category>().is_err());
    }

    #[test]
    fn test_parse_for_rejects_other_set() {
        assert!(Category::parse_for(TransactionType::Income, "Food & Dining").is_err());
        assert!(Category::parse_for(TransactionType::Expense, "Food & Dining").is_ok());
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ExpenseCategory::BillsAndUtilities).unwrap();
        assert_eq!(json, "\"Bills & Utilities\"");
        let freq: RecurringFrequency = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(freq, RecurringFrequency::Monthly);
    }
}
