use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::UnknownTicketType;
use crate::{AccountId, Order, OrderId, Outcome, TicketType, TicketTypeRequest};

/// Errors that can occur when reading orders or writing outcomes
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open '{}': {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unrecognized ticket type '{ticket_type}'")]
    UnrecognizedType { line: usize, ticket_type: String },

    #[error("line {line}: ticket row missing type")]
    MissingType { line: usize },

    #[error("line {line}: ticket row missing quantity")]
    MissingQuantity { line: usize },

    #[error("line {line}: order {order} names more than one account")]
    AccountMismatch { line: usize, order: OrderId },

    #[error("failed to write outcomes: {0}")]
    Write(#[source] csv::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    order: OrderId,
    account: Option<AccountId>,
    r#type: Option<String>,
    quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    order: OrderId,
    account: Option<AccountId>,
    status: &'static str,
    amount: Option<u64>,
    seats: Option<u32>,
    tickets: Option<u32>,
    reason: String,
}

/// Read orders from a csv file.
pub fn read_orders(path: impl AsRef<Path>) -> Result<OrderReader<File>, CsvError> {
    let path = path.as_ref();
    let reader = reader_builder()
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    OrderReader::new(reader)
}

/// Same as [`read_orders`], over any reader.
pub fn read_orders_from<R: io::Read>(reader: R) -> Result<OrderReader<R>, CsvError> {
    OrderReader::new(reader_builder().from_reader(reader))
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    // field counts are checked per row so a ragged row keeps its order id
    builder.trim(csv::Trim::All).flexible(true);
    builder
}

/// Orders read from csv rows.
///
/// Consecutive rows sharing an `order` id make up one order. A bad row
/// rejects its whole order; rows with no readable order id are reported alone.
pub struct OrderReader<R: io::Read> {
    rows: Peekable<Rows<R>>,
}

impl<R: io::Read> OrderReader<R> {
    fn new(mut reader: csv::Reader<R>) -> Result<Self, CsvError> {
        let headers = reader
            .byte_headers()
            .map_err(|source| CsvError::Parse { line: 1, source })?
            .clone();
        let order_column = headers.iter().position(|h| h == b"order");

        let rows = Rows {
            records: reader.into_byte_records(),
            headers,
            order_column,
            line: 1,
        };
        Ok(Self {
            rows: rows.peekable(),
        })
    }
}

impl<R: io::Read> Iterator for OrderReader<R> {
    type Item = Result<Order, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rows.next()?;
        let key = first.order;

        let mut order = Order {
            id: key.unwrap_or_default(),
            account: None,
            requests: Vec::new(),
        };
        let mut result = Ok(());
        let mut is_first = true;
        let mut next = Some(first);

        // drain every row of the order, even once one of them failed
        while let Some(row) = next {
            if result.is_ok() {
                result = add_row(&mut order, row, is_first);
            }
            is_first = false;
            next = key.and_then(|id| self.rows.next_if(|row| row.order == Some(id)));
        }

        Some(result.map(|()| order))
    }
}

/// A raw csv row, keyed by its order id when that much could be read.
struct Row {
    line: usize,
    order: Option<OrderId>,
    parsed: Result<InputRow, CsvError>,
}

struct Rows<R> {
    records: csv::ByteRecordsIntoIter<R>,
    headers: csv::ByteRecord,
    order_column: Option<usize>,
    line: usize,
}

impl<R: io::Read> Iterator for Rows<R> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let record = self.records.next()?;
        self.line += 1;
        let line = self.line;

        let record = match record {
            Ok(record) => record,
            Err(source) => {
                return Some(Row {
                    line,
                    order: None,
                    parsed: Err(CsvError::Parse { line, source }),
                });
            }
        };

        // read the order id from raw bytes so any other defect still names it
        let order = self
            .order_column
            .and_then(|i| record.get(i))
            .and_then(|id| std::str::from_utf8(id).ok())
            .and_then(|id| id.parse().ok());

        let parsed = if record.len() != self.headers.len() {
            Err(CsvError::FieldCount {
                line,
                expected: self.headers.len(),
                found: record.len(),
            })
        } else {
            record
                .deserialize::<InputRow>(Some(&self.headers))
                .map_err(|source| CsvError::Parse { line, source })
        };

        Some(Row {
            line,
            order,
            parsed,
        })
    }
}

fn add_row(order: &mut Order, row: Row, is_first: bool) -> Result<(), CsvError> {
    let line = row.line;
    let row = row.parsed?;

    if is_first {
        order.id = row.order;
        order.account = row.account;
    } else if row.account != order.account {
        return Err(CsvError::AccountMismatch {
            line,
            order: order.id,
        });
    }

    let (ticket_type, quantity) = match (row.r#type, row.quantity) {
        // a row with neither type nor quantity only declares the order
        (None, None) => return Ok(()),
        (None, Some(_)) => return Err(CsvError::MissingType { line }),
        (Some(_), None) => return Err(CsvError::MissingQuantity { line }),
        (Some(ticket_type), Some(quantity)) => (ticket_type, quantity),
    };
    let ticket_type = ticket_type
        .parse::<TicketType>()
        .map_err(|UnknownTicketType(ticket_type)| CsvError::UnrecognizedType {
            line,
            ticket_type,
        })?;

    order
        .requests
        .push(TicketTypeRequest::new(ticket_type, quantity));
    Ok(())
}

/// Write one csv row per outcome
pub fn write_outcomes<'a>(
    writer: impl io::Write,
    outcomes: impl IntoIterator<Item = &'a Outcome>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for outcome in outcomes {
        let row = match &outcome.result {
            Ok(purchase) => OutputRow {
                order: outcome.order,
                account: outcome.account,
                status: "purchased",
                amount: Some(purchase.amount_due.units()),
                seats: Some(purchase.seats_to_allocate),
                tickets: Some(purchase.total_tickets),
                reason: String::new(),
            },
            Err(e) => OutputRow {
                order: outcome.order,
                account: outcome.account,
                status: if e.is_rejection() { "rejected" } else { "failed" },
                amount: None,
                seats: None,
                tickets: None,
                reason: e.to_string(),
            },
        };
        writer.serialize(&row).map_err(CsvError::Write)?;
    }

    writer
        .flush()
        .map_err(|e| CsvError::Write(csv::Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Purchase, PurchaseError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn read(content: &str) -> Vec<Result<Order, CsvError>> {
        let file = write_csv(content);
        read_orders(file.path()).unwrap().collect()
    }

    fn read_bytes(content: &[u8]) -> Vec<Result<Order, CsvError>> {
        read_orders_from(content).unwrap().collect()
    }

    #[test]
    fn read_single_order() {
        let results = read("order,account,type,quantity\n1,1,adult,2\n1,1,child,3\n");
        assert_eq!(results.len(), 1);

        let order = results.into_iter().next().unwrap().unwrap();
        assert_eq!(order.id, 1);
        assert_eq!(order.account, Some(1));
        assert_eq!(
            order.requests,
            vec![
                TicketTypeRequest::new(TicketType::Adult, 2),
                TicketTypeRequest::new(TicketType::Child, 3),
            ]
        );
    }

    #[test]
    fn read_groups_consecutive_rows() {
        let results = read("order,account,type,quantity\n1,1,adult,2\n2,5,adult,1\n2,5,infant,1\n");
        let orders: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].requests.len(), 1);
        assert_eq!(orders[1].id, 2);
        assert_eq!(orders[1].account, Some(5));
        assert_eq!(orders[1].requests.len(), 2);
    }

    #[test]
    fn read_with_whitespace_and_case() {
        let results = read("order, account, type, quantity\n1, 1, ADULT, 2\n");
        assert_eq!(results.len(), 1);
        let order = results[0].as_ref().unwrap();
        assert_eq!(
            order.requests,
            vec![TicketTypeRequest::new(TicketType::Adult, 2)]
        );
    }

    #[test]
    fn read_missing_account_is_none() {
        let results = read("order,account,type,quantity\n1,,adult,2\n");
        assert_eq!(results[0].as_ref().unwrap().account, None);
    }

    #[test]
    fn read_row_without_type_declares_empty_order() {
        let results = read("order,account,type,quantity\n4,0,,\n");
        let order = results[0].as_ref().unwrap();
        assert_eq!(order.id, 4);
        assert_eq!(order.account, Some(0));
        assert!(order.requests.is_empty());
    }

    #[test]
    fn read_returns_error_for_unknown_type() {
        let results = read("order,account,type,quantity\n1,1,senior,1\n");
        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedType { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_quantity() {
        let results = read("order,account,type,quantity\n1,1,adult,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::MissingQuantity { line: 2 }));
    }

    #[test]
    fn bad_row_rejects_its_whole_order() {
        let results = read(
            "order,account,type,quantity\n1,1,adult,2\n1,1,child,-3\n1,1,infant,1\n2,2,adult,1\n",
        );
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::Parse { line: 3, .. }
        ));
        assert_eq!(results[1].as_ref().unwrap().id, 2);
    }

    #[test]
    fn short_row_rejects_its_whole_order() {
        let results = read(
            "order,account,type,quantity\n1,1,adult,2\n1,1,child\n1,1,infant,1\n2,2,adult,1\n",
        );
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::FieldCount {
                line: 3,
                expected: 4,
                found: 3
            }
        ));
        assert_eq!(results[1].as_ref().unwrap().id, 2);
    }

    #[test]
    fn long_row_rejects_its_whole_order() {
        let results = read("order,account,type,quantity\n1,1,adult,2\n1,1,child,1,9\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::FieldCount {
                line: 3,
                expected: 4,
                found: 5
            }
        ));
    }

    #[test]
    fn invalid_utf8_rejects_its_whole_order() {
        let results = read_bytes(
            b"order,account,type,quantity\n1,1,adult,2\n1,1,ch\xffild,1\n1,1,infant,1\n2,2,adult,1\n",
        );
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::Parse { line: 3, .. }
        ));
        assert_eq!(results[1].as_ref().unwrap().id, 2);
    }

    #[test]
    fn quantity_without_type_fails() {
        let results = read("order,account,type,quantity\n1,1,adult,2\n1,1,,3\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::MissingType { line: 3 }
        ));
    }

    #[test]
    fn reader_outlives_its_path() {
        fn assert_send_static<T: Send + 'static>(_: &T) {}

        let file = write_csv("order,account,type,quantity\n1,1,adult,1\n");
        let orders = {
            let path = file.path().to_string_lossy().into_owned();
            read_orders(&path).unwrap()
        };
        assert_send_static(&orders);
        assert_eq!(orders.count(), 1);
    }

    #[test]
    fn mismatched_accounts_reject_the_order() {
        let results = read("order,account,type,quantity\n1,1,adult,2\n1,2,child,1\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::AccountMismatch { line: 3, order: 1 }
        ));
    }

    #[test]
    fn unreadable_order_id_is_reported_alone() {
        let results = read("order,account,type,quantity\nx,1,adult,2\n3,1,adult,1\n");
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::Parse { line: 2, .. }
        ));
        assert_eq!(results[1].as_ref().unwrap().id, 3);
    }

    #[test]
    fn read_from_reader() {
        let input = "order,account,type,quantity\n1,1,adult,1\n".as_bytes();
        let orders: Vec<_> = read_orders_from(input).unwrap().collect();
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn open_missing_file_fails() {
        let result = read_orders("does/not/exist.csv");
        assert!(matches!(result, Err(CsvError::Open { .. })));
    }

    #[test]
    fn write_outcome_rows() {
        let outcomes = vec![
            Outcome {
                order: 1,
                account: Some(1),
                result: Ok(Purchase {
                    total_tickets: 6,
                    seats_to_allocate: 5,
                    amount_due: crate::Amount::new(70),
                    adults: 2,
                }),
            },
            Outcome {
                order: 2,
                account: None,
                result: Err(PurchaseError::InvalidAccount),
            },
        ];

        let mut out = Vec::new();
        write_outcomes(&mut out, &outcomes).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "order,account,status,amount,seats,tickets,reason");
        assert_eq!(lines[1], "1,1,purchased,70,5,6,");
        assert_eq!(lines[2], "2,,rejected,,,,invalid account id");
    }
}
