use super::identifier::{ConfigIdentifier, SiteToken};
use tracing::warn;

/// Length of the `JOBNAME` placeholder in the job script template.
pub const JOB_NAME_BUDGET: usize = 8;

/// The directory a configuration is materialized into.
///
/// `{site}` for an adsorbate above the surface, `V-{site}` with a vacancy, a
/// trailing `-{orientation}` when one is encoded, and `Avg-{site}` for averaged
/// sites.
pub fn folder_name(id: &ConfigIdentifier) -> String {
    let site = id.site().to_string();
    if id.site().is_average() {
        return format!("Avg-{site}");
    }
    let mut name = if id.vacancy() {
        format!("V-{site}")
    } else {
        site
    };
    if let Some(suffix) = id.suffix() {
        name.push('-');
        name.push_str(suffix);
    }
    name
}

/// The short scheduler job name for a configuration, followed by `trail`.
///
/// Water is shortened to `WT` in vacancy names to keep them within
/// [`JOB_NAME_BUDGET`]; longer names are kept but logged.
pub fn job_name(id: &ConfigIdentifier, trail: &str) -> String {
    let site = id.site().to_string();
    let suffix = id.suffix().unwrap_or_default();
    let base = match id.site() {
        SiteToken::Average { .. } => format!("A{site}{}", id.molecule()),
        _ if id.vacancy() => {
            let molecule = match id.molecule() {
                "H2O" => "WT",
                other => other,
            };
            format!("V{site}{molecule}{suffix}")
        }
        _ => format!("{site}{}{suffix}", id.molecule()),
    };
    let name = format!("{base}{trail}");
    if name.len() > JOB_NAME_BUDGET {
        warn!(
            job_name = %name,
            budget = JOB_NAME_BUDGET,
            "Job name exceeds the placeholder length."
        );
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConfigIdentifier {
        s.parse().unwrap()
    }

    #[test]
    fn folder_names_follow_site_and_orientation() {
        assert_eq!(folder_name(&id("POSCAR_H2O_Vac_O0_HDL")), "V-O0-HDL");
        assert_eq!(folder_name(&id("POSCAR_H2O_above_O3_OD")), "O3-OD");
        assert_eq!(folder_name(&id("POSCAR_N_above_W2")), "W2");
        assert_eq!(folder_name(&id("POSCAR_H_above_O014_avg")), "Avg-O014");
    }

    #[test]
    fn job_names_shorten_water_in_vacancies() {
        assert_eq!(job_name(&id("POSCAR_H2O_Vac_O0_HDL"), ""), "VO0WTHDL");
        assert_eq!(job_name(&id("POSCAR_N2_Vac_O1_UPR"), ""), "VO1N2UPR");
        assert_eq!(job_name(&id("POSCAR_H2O_above_O3_OD"), ""), "O3H2OOD");
        assert_eq!(job_name(&id("POSCAR_H_above_O014_avg"), "x"), "AO014Hx");
    }

    #[test]
    fn over_budget_job_names_are_kept_whole() {
        let name = job_name(&id("POSCAR_H2O_above_O12_HDL"), "run");
        assert_eq!(name, "O12H2OHDLrun");
    }
}
