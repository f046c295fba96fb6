use crate::blocks::Block;
use crate::blocks::kinds::Table;
use crate::mapper::TargetElementRecord;

use super::{Batch, Planner, Strategy, find_containing};

/// Pipe-table rows changed in place: each changed row's text is carried onto
/// `container`, or onto whichever element contains the row.
///
/// A changed row count produces no patch.
pub(crate) fn plan_table_rows(
    planner: &Planner<'_>,
    position: usize,
    container: Option<&TargetElementRecord>,
    old: &Block,
    new: &Block,
    batch: &mut Batch,
) {
    let old_rows = Table::rows(&old.text);
    let new_rows = Table::rows(&new.text);
    if old_rows.len() != new_rows.len() {
        batch.skip(position, "table row count changed");
        return;
    }

    for (o, n) in old_rows.iter().zip(&new_rows) {
        if o == n {
            continue;
        }
        let (old_plain, new_plain) = (Table::row_plain_text(o), Table::row_plain_text(n));
        let target = container
            .or_else(|| find_containing(&old_plain, planner.index.records(), &batch.used));
        match target {
            Some(record) => batch.group(&record.address, Strategy::Table, old_plain, new_plain),
            None => batch.skip(position, "table row has no containing element"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::PatchOperation;
    use super::super::tests::plan_with;
    use super::*;
    use pretty_assertions::assert_eq;

    // The header differs from the block, so only single rows can be located.
    const TARGET: &str = concat!(
        "<table><tbody><tr><th>Service</th><th>Port</th></tr>",
        "<tr><td>alpha service</td><td>8080</td></tr></tbody></table>"
    );

    #[test]
    fn changed_row_is_carried_onto_table() {
        let plan = plan_with(
            "| Name | Port |\n| --- | --- |\n| alpha service | 8080 |\n",
            "| Name | Port |\n| --- | --- |\n| alpha service | 9090 |\n",
            TARGET,
            Some(Vec::new()),
        );
        assert_eq!(plan.patches.len(), 1);
        assert_eq!(plan.patches[0].strategy, Strategy::Table);
        let PatchOperation::ModifyText { address, new_plain, .. } = &plan.patches[0].operation else {
            panic!("expected ModifyText");
        };
        assert_eq!(address, "table[1]");
        assert_eq!(new_plain, "ServicePortalpha service9090");
    }

    #[test]
    fn row_count_change_is_skipped() {
        let plan = plan_with(
            "| Name | Port |\n| --- | --- |\n| alpha service | 8080 |\n",
            "| Name | Port |\n| --- | --- |\n| alpha service | 8080 |\n| beta | 1 |\n",
            TARGET,
            Some(Vec::new()),
        );
        assert!(plan.patches.is_empty());
        assert_eq!(plan.skipped[0].reason, "table row count changed");
    }
}
