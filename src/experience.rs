use crate::stat_map::StatMap;

/// One experience-tick definition: the stat key it increments and the parent
/// keys a squad-scoped tick also bumps. The mapping lives in this one table
/// so compound increments stay auditable and testable in isolation.
#[derive(Debug, Clone, Copy)]
pub struct ExpDef {
    pub id: &'static str,
    pub name: &'static str,
    pub parents: &'static [&'static str],
}

pub const REVIVE: &str = "7";
pub const SQUAD_REVIVE: &str = "53";
pub const ROUTER_SPAWN: &str = "1410";
pub const ROUTER_KILL: &str = "1409";
pub const SUNDERER_SPAWN: &str = "233";
pub const BEACON_KILL: &str = "270";

/// Item id of the deployable router, seen on the pull signal.
pub const ROUTER_ITEM_ID: &str = "6003880";

pub const CATALOG: &[ExpDef] = &[
    ExpDef { id: "2", name: "Kill assist", parents: &[] },
    ExpDef { id: "3", name: "Kill assist", parents: &[] },
    ExpDef { id: "371", name: "Kill assist", parents: &[] },
    ExpDef { id: "372", name: "Kill assist", parents: &[] },
    ExpDef { id: "4", name: "Heal", parents: &[] },
    ExpDef { id: "51", name: "Squad heal", parents: &["Heal"] },
    ExpDef { id: "7", name: "Revive", parents: &[] },
    ExpDef { id: "53", name: "Squad revive", parents: &["Revive"] },
    ExpDef { id: "34", name: "Resupply", parents: &[] },
    ExpDef { id: "55", name: "Squad resupply", parents: &["Resupply"] },
    ExpDef { id: "142", name: "MAX repair", parents: &[] },
    ExpDef { id: "236", name: "Squad MAX repair", parents: &["MAX repair"] },
    ExpDef { id: "438", name: "Shield repair", parents: &[] },
    ExpDef { id: "439", name: "Squad shield repair", parents: &["Shield repair"] },
    ExpDef { id: "293", name: "Motion detect", parents: &[] },
    ExpDef { id: "294", name: "Squad motion detect", parents: &["Motion detect"] },
    ExpDef { id: "10", name: "Domination", parents: &[] },
    ExpDef { id: "11", name: "Revenge", parents: &[] },
    ExpDef { id: "26", name: "Roadkill", parents: &[] },
    ExpDef { id: "335", name: "Savior", parents: &[] },
    ExpDef { id: "19", name: "Base capture", parents: &[] },
    ExpDef { id: "598", name: "Base capture", parents: &[] },
    ExpDef { id: "272", name: "Point control", parents: &[] },
    ExpDef { id: "556", name: "Point control", parents: &[] },
    ExpDef { id: "557", name: "Point control", parents: &[] },
    ExpDef { id: "56", name: "Squad spawn", parents: &[] },
    ExpDef { id: "220", name: "Squad spawn", parents: &[] },
    ExpDef { id: "233", name: "Sunderer spawn", parents: &[] },
    ExpDef { id: "1410", name: "Router spawn", parents: &[] },
    ExpDef { id: "1409", name: "Router kill", parents: &[] },
    ExpDef { id: "270", name: "Beacon kill", parents: &[] },
    ExpDef { id: "201", name: "Transport assist", parents: &[] },
    ExpDef { id: "230", name: "Transport assist", parents: &[] },
    ExpDef { id: "268", name: "Transport assist", parents: &[] },
    ExpDef { id: "350", name: "Transport assist", parents: &[] },
    ExpDef { id: "664", name: "Transport assist", parents: &[] },
];

/// Catch-all for experience ids outside the catalog, keeping the mapping
/// total: every tick lands on exactly one definition.
pub const OTHER: ExpDef = ExpDef {
    id: "0",
    name: "Other",
    parents: &[],
};

pub fn lookup(exp_id: &str) -> &'static ExpDef {
    CATALOG.iter().find(|def| def.id == exp_id).unwrap_or(&OTHER)
}

pub fn is_revive(exp_id: &str) -> bool {
    exp_id == REVIVE || exp_id == SQUAD_REVIVE
}

/// Increment the stat for one experience tick, chaining into parent keys.
/// Returns the definition so callers can reuse the resolved name.
pub fn apply(stats: &mut StatMap, exp_id: &str) -> &'static ExpDef {
    let def = lookup(exp_id);
    stats.increment(def.name);
    for parent in def.parents {
        stats.increment(parent);
    }
    def
}
