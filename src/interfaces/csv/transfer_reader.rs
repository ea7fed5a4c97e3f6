use crate::domain::transfer::TransferRequest;
use crate::error::{BankError, Result};
use std::io::Read;

/// Reads transfer requests from a CSV source with the header
/// `sender,to_account_number,amount,category,title`.
///
/// Malformed rows surface as errors from the iterator without stopping it.
pub struct TransferReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransferReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes the requests.
    pub fn requests(self) -> impl Iterator<Item = Result<TransferRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(BankError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transfer::TransferCategory;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "sender, to_account_number, amount, category, title\n\
                    1, PL02, 100.50, FOOD, Dinner\n\
                    2, DE99, 3, BILLS, Phone";
        let results: Vec<Result<TransferRequest>> =
            TransferReader::new(data.as_bytes()).requests().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.sender, 1);
        assert_eq!(first.to_account_number, "PL02");
        assert_eq!(first.amount.value(), dec!(100.50));
        assert_eq!(first.category, TransferCategory::Food);
        assert_eq!(results[1].as_ref().unwrap().title, "Phone");
    }

    #[test]
    fn test_reader_rejects_non_positive_amount() {
        let data = "sender,to_account_number,amount,category,title\n1,PL02,-5,FOOD,Refund";
        let results: Vec<_> = TransferReader::new(data.as_bytes()).requests().collect();
        assert!(results[0].is_err());
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "sender,to_account_number,amount,category,title\n\
                    abc,PL02,5,FOOD,x\n\
                    1,PL02,5,GIFTS,x\n\
                    1,PL02,5,FOOD,ok";
        let results: Vec<_> = TransferReader::new(data.as_bytes()).requests().collect();
        assert!(results[0].is_err());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
