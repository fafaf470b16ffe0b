use crate::domain::constants::{NOT_AVAILABLE, PREMIUM_ACCOUNTS};
use crate::domain::models::{
    Affiliation, GroupEntry, GroupMembership, Member, PasswdEntry, UserProfile,
};
use crate::error::ReportError;
use std::collections::BTreeMap;

pub fn parse_group_line(line: &str) -> Result<GroupEntry, ReportError> {
    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(':').collect();
    if fields.len() != 4 {
        return Err(ReportError::MissingData(format!(
            "malformed group entry: {}",
            line
        )));
    }
    let gid = fields[2]
        .parse()
        .map_err(|_| ReportError::MissingData(format!("bad gid in group entry: {}", line)))?;
    let members = fields[3]
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    Ok(GroupEntry {
        name: fields[0].to_string(),
        gid,
        members,
    })
}

pub fn parse_passwd_line(line: &str) -> Result<PasswdEntry, ReportError> {
    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(':').collect();
    if fields.len() != 7 {
        return Err(ReportError::MissingData(format!(
            "malformed passwd entry: {}",
            line
        )));
    }
    let bad = || ReportError::MissingData(format!("bad uid/gid in passwd entry: {}", line));
    Ok(PasswdEntry {
        user: fields[0].to_string(),
        uid: fields[2].parse().map_err(|_| bad())?,
        gid: fields[3].parse().map_err(|_| bad())?,
        gecos: fields[4].to_string(),
    })
}

pub fn parse_passwd(raw: &str) -> Result<Vec<PasswdEntry>, ReportError> {
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(parse_passwd_line)
        .collect()
}

pub fn resolve_membership(group: &GroupEntry, passwd: &[PasswdEntry]) -> GroupMembership {
    let mut members: BTreeMap<String, Affiliation> = BTreeMap::new();
    for user in &group.members {
        members.insert(user.clone(), Affiliation::Secondary);
    }
    for entry in passwd.iter().filter(|p| p.gid == group.gid) {
        members.insert(entry.user.clone(), Affiliation::Primary);
    }
    GroupMembership {
        group: group.name.clone(),
        gid: group.gid,
        members: members
            .into_iter()
            .map(|(user, affiliation)| Member { user, affiliation })
            .collect(),
    }
}

fn gecos_field(gecos: &str, index: usize) -> String {
    gecos
        .split(',')
        .nth(index)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Built-in account types come first, in tier order; other configured types
/// follow by name.
pub fn premium_accounts(groups: &[String], table: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut accounts: Vec<&String> = table
        .iter()
        .filter(|(_, granting)| granting.iter().any(|g| groups.contains(g)))
        .map(|(account, _)| account)
        .collect();
    accounts.sort_by(|a, b| tier(a).cmp(&tier(b)).then_with(|| a.cmp(b)));
    accounts.into_iter().cloned().collect()
}

fn tier(account: &str) -> usize {
    PREMIUM_ACCOUNTS
        .iter()
        .position(|(name, _)| *name == account)
        .unwrap_or(PREMIUM_ACCOUNTS.len())
}

pub fn build_profile(
    entry: &PasswdEntry,
    groups: &[String],
    premium: &BTreeMap<String, Vec<String>>,
) -> UserProfile {
    UserProfile {
        user: entry.user.clone(),
        name: gecos_field(&entry.gecos, 0),
        email: gecos_field(&entry.gecos, 4),
        account_types: premium_accounts(groups, premium),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ConfigFile;

    fn passwd(user: &str, gid: u32, gecos: &str) -> PasswdEntry {
        PasswdEntry {
            user: user.to_string(),
            uid: 1000,
            gid,
            gecos: gecos.to_string(),
        }
    }

    #[test]
    fn parses_group_line_with_members() {
        let g = parse_group_line("labx:*:5001:carol,dave\n").unwrap();
        assert_eq!(g.name, "labx");
        assert_eq!(g.gid, 5001);
        assert_eq!(g.members, vec!["carol", "dave"]);
    }

    #[test]
    fn parses_group_line_without_members() {
        let g = parse_group_line("empty:x:7000:").unwrap();
        assert!(g.members.is_empty());
    }

    #[test]
    fn rejects_truncated_passwd_line() {
        let err = parse_passwd_line("alice:x:1000").unwrap_err();
        assert!(matches!(err, ReportError::MissingData(_)));
    }

    #[test]
    fn primary_affiliation_wins_and_members_are_sorted() {
        let group = GroupEntry {
            name: "labx".to_string(),
            gid: 5001,
            members: vec!["carol".to_string(), "alice".to_string()],
        };
        let entries = vec![
            passwd("alice", 5001, ""),
            passwd("bob", 5001, ""),
            passwd("zed", 9999, ""),
        ];
        let m = resolve_membership(&group, &entries);
        let got: Vec<(&str, Affiliation)> = m
            .members
            .iter()
            .map(|m| (m.user.as_str(), m.affiliation))
            .collect();
        assert_eq!(
            got,
            vec![
                ("alice", Affiliation::Primary),
                ("bob", Affiliation::Primary),
                ("carol", Affiliation::Secondary),
            ]
        );
    }

    #[test]
    fn gecos_name_and_email_fall_back_to_na() {
        let premium = ConfigFile::default().premium;
        let full = build_profile(
            &passwd("alice", 1, "Alice Smith,Room 1,555,,alice@example.edu"),
            &[],
            &premium,
        );
        assert_eq!(full.name, "Alice Smith");
        assert_eq!(full.email, "alice@example.edu");

        let bare = build_profile(&passwd("bob", 1, ""), &[], &premium);
        assert_eq!(bare.name, "NA");
        assert_eq!(bare.email, "NA");
    }

    #[test]
    fn premium_accounts_follow_granting_groups() {
        let premium = ConfigFile::default().premium;
        let groups: Vec<String> = ["labx", "priority3", "pri-gpu+1", "users"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            premium_accounts(&groups, &premium),
            vec!["priority", "pri-gpu+"]
        );
    }

    #[test]
    fn premium_accounts_keep_tier_order_then_custom_names() {
        let mut premium = ConfigFile::default().premium;
        premium.insert("condo".to_string(), vec!["condo-lab".to_string()]);
        let groups: Vec<String> = ["gpu-he", "pri-gpu", "priority+", "condo-lab", "priority"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            premium_accounts(&groups, &premium),
            vec!["priority", "priority+", "pri-gpu", "gpu-he", "condo"]
        );
    }
}
