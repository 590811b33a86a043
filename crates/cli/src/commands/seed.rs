use triage_db::DemoSeedDataset;

use crate::commands::{CommandFailure, CommandResult, run_database_command};

pub fn run() -> CommandResult {
    run_database_command("seed", |pool| async move {
        DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| CommandFailure::new("seed_execution", error, 5))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| CommandFailure::new("seed_verification", error, 6))?;
        if !verification.all_present {
            return Err(CommandFailure::new(
                "seed_verification",
                verification_message(&verification.checks),
                6,
            ));
        }

        let order_descriptions: Vec<String> = DemoSeedDataset::order_descriptions()
            .iter()
            .map(|(order_id, description)| format!("  - {order_id}: {description}"))
            .collect();
        Ok(format!(
            "Demo dataset loaded for the support scenarios:\n{}",
            order_descriptions.join("\n")
        ))
    })
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("seed-user", true), ("ORD-456", false), ("ORD-789-invoice", false)];
        assert_eq!(
            verification_message(&checks),
            "Seed verification failed for checks: ORD-456, ORD-789-invoice"
        );
    }

    #[test]
    fn verification_message_falls_back_when_no_check_is_named() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }
}
