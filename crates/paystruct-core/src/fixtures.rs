//! Record builders shared by the unit tests.

use crate::entity::{Contract, Contractor, Project, StatementStatus, StatusStatement};

pub fn contractor(id: &str, first: &str, last: &str) -> Contractor {
  Contractor {
    id:              id.into(),
    legal_entity:    false,
    first_name:      first.into(),
    last_name:       last.into(),
    national_id:     format!("00{id}"),
    preferential_id: None,
  }
}

pub fn company(id: &str, name: &str) -> Contractor {
  Contractor {
    legal_entity: true,
    ..contractor(id, "شرکت", name)
  }
}

pub fn project(id: &str, name: &str) -> Project {
  Project {
    id:    id.into(),
    name:  name.into(),
    phase: None,
  }
}

pub fn contract(id: &str, contractor_id: &str, end: &str) -> Contract {
  Contract {
    id:               id.into(),
    contractor_id:    contractor_id.into(),
    project_id:       "p1".into(),
    contract_number:  format!("C-{id}"),
    gross_budget:     1000.0,
    start_date:       None,
    end_date:         Some(end.into()),
    insurance_rate:   5.0,
    performance_bond: 10.0,
    added_value_tax:  9.0,
    scanned_file:     None,
  }
}

pub fn statement(id: &str, number: f64, status: StatementStatus, amount: f64) -> StatusStatement {
  StatusStatement {
    id:                   id.into(),
    contractor_id:        "a".into(),
    project_id:           "p1".into(),
    progress_percent:     number * 10.0,
    statement_date_start: None,
    statement_date_end:   None,
    status,
    number,
    contract_number:      "C-1".into(),
    total_amount:         amount,
    project_name:         "Tower".into(),
  }
}
