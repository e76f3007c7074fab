//! Deletion priority table
//!
//! Higher rank = deleted earlier. The table encodes provider semantics that
//! the per-kind `dependencies` lists do not capture on their own: compute
//! goes before the storage and networking it sits on, standalone keys and
//! secrets go before their vault, and the VCN is deleted dead last.
//!
//! Kinds that are absent get [`DEFAULT_PRIORITY`], which sits in the middle
//! so that unanticipated kinds neither race ahead of compute nor trail
//! behind networking.

use crate::defaults::DEFAULT_PRIORITY;

/// Static kind → rank table
pub const PRIORITY_TABLE: &[(&str, u16)] = &[
    // Workloads that hold everything else in place
    ("ClusterNetwork", 100),
    ("InstancePool", 99),
    ("NodePool", 98),
    ("Cluster", 97),
    ("Instance", 96),
    ("ContainerInstance", 95),
    ("InstanceConfiguration", 94),
    ("AutoScalingConfiguration", 94),
    ("DataScienceModelDeployment", 92),
    ("DataScienceNotebookSession", 92),
    ("Function", 90),
    ("Application", 89),
    ("ApiDeployment", 88),
    ("ApiGateway", 87),
    ("LoadBalancer", 86),
    ("NetworkLoadBalancer", 86),
    ("AutonomousDatabase", 85),
    ("DbSystem", 85),
    ("MysqlDbSystem", 85),
    ("Bastion", 84),
    // Attachments before what they attach
    ("VolumeAttachment", 80),
    ("BootVolumeAttachment", 80),
    ("Export", 79),
    ("MountTarget", 78),
    ("FileSystem", 77),
    ("ExportSet", 76),
    // Storage
    ("VolumeGroup", 72),
    ("Volume", 70),
    ("BootVolume", 70),
    ("VolumeBackup", 68),
    ("BootVolumeBackup", 68),
    ("Image", 66),
    ("Bucket", 64),
    // Secrets and keys before their container vault
    ("Certificate", 63),
    ("CertificateAuthority", 63),
    ("VaultSecret", 62),
    ("Key", 61),
    ("Vault", 30),
    // Logging
    ("ServiceConnector", 58),
    ("Log", 57),
    ("LogGroup", 56),
    // Networking, innermost first
    ("PrivateIp", 28),
    ("PublicIp", 27),
    ("NetworkSecurityGroup", 25),
    ("DrgAttachment", 24),
    ("LocalPeeringGateway", 23),
    ("Subnet", 22),
    ("InternetGateway", 20),
    ("NatGateway", 20),
    ("ServiceGateway", 20),
    ("RouteTable", 18),
    ("SecurityList", 17),
    ("DHCPOptions", 16),
    ("Drg", 12),
    // Nested scopes only empty out once everything above is gone
    ("Compartment", 2),
    ("Vcn", 0),
];

/// Rank of `kind`, or the neutral default if the table does not mention it
pub fn cleanup_priority(kind: &str) -> u16 {
    PRIORITY_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, rank)| *rank)
        .unwrap_or(DEFAULT_PRIORITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_instances_before_volumes() {
        assert!(
            cleanup_priority("Instance") > cleanup_priority("Volume"),
            "Instances must be deleted before the volumes they use"
        );
        assert!(cleanup_priority("Instance") > cleanup_priority("Subnet"));
    }

    #[test]
    fn test_vcn_is_last() {
        let vcn = cleanup_priority("Vcn");
        for (kind, rank) in PRIORITY_TABLE {
            if *kind != "Vcn" {
                assert!(*rank > vcn, "{kind} must be deleted before Vcn");
            }
        }
    }

    #[test]
    fn test_keys_before_vault() {
        assert!(cleanup_priority("Key") > cleanup_priority("Vault"));
        assert!(cleanup_priority("VaultSecret") > cleanup_priority("Vault"));
    }

    #[test]
    fn test_unknown_kind_gets_default() {
        assert_eq!(cleanup_priority("SomethingNew"), DEFAULT_PRIORITY);
        assert!(DEFAULT_PRIORITY < cleanup_priority("Instance"));
        assert!(DEFAULT_PRIORITY > cleanup_priority("Subnet"));
    }

    #[test]
    fn test_table_has_unique_kinds() {
        let kinds: HashSet<_> = PRIORITY_TABLE.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds.len(), PRIORITY_TABLE.len());
    }
}
