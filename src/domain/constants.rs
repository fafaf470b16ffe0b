pub const DEFAULT_PARTITIONS: &[&str] = &["batch", "bigmem", "gpu"];

pub const DEFAULT_SACCT: &str = "/usr/local/bin/sacct";

pub const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

// `{group}` is replaced with the group name.
pub const DEFAULT_QUOTA_REPORT: &str = "/gpfs/data/ccvstaff/quota-reports/{group}-quota-report.txt";

pub const DEFAULT_TITLE: &str = "Oscar resource usage report";

pub const DEFAULT_TOP_CONSUMERS: usize = 5;

pub const DEFAULT_WARN_RATIO: f64 = 0.9;

pub const SNAPSHOT_FILE: &str = "snapshot.json";

pub const NOT_AVAILABLE: &str = "NA";

pub const PREMIUM_ACCOUNTS: &[(&str, &[&str])] = &[
    (
        "priority",
        &[
            "priority",
            "priority1",
            "priority2",
            "priority3",
            "priority4",
            "priority5",
            "priority6",
            "priority7",
            "priority8",
            "priority9",
        ],
    ),
    ("priority+", &["priority+", "priority+1"]),
    ("pri-gpu", &["pri-gpu", "pri-gpu1"]),
    ("pri-gpu+", &["pri-gpu+", "pri-gpu+1"]),
    ("gpu-he", &["gpu-he", "gpu-he1"]),
];

pub const SECTION_SUMMARY: &str = "Summary";
pub const SECTION_STORAGE: &str = "Storage";
pub const SECTION_USAGE: &str = "Usage";
pub const SECTION_MEMBERS: &str = "Group members";
