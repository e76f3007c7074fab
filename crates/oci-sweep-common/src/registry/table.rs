use super::{OperationRef, ParentLookup, ResourceTypeDescriptor as D, SpecialHandling};

const COMPUTE: &str = "core.ComputeClient";
const COMPUTE_MGMT: &str = "core.ComputeManagementClient";
const BLOCKSTORAGE: &str = "core.BlockstorageClient";
const NETWORK: &str = "core.VirtualNetworkClient";
const OBJECT_STORAGE: &str = "object_storage.ObjectStorageClient";
const KMS_VAULT: &str = "key_management.KmsVaultClient";
const KMS_MGMT: &str = "key_management.KmsManagementClient";
const LOGGING: &str = "logging.LoggingManagementClient";
const IDENTITY: &str = "identity.IdentityClient";
const CERTIFICATES: &str = "certificates_management.CertificatesManagementClient";
const DATA_SCIENCE: &str = "data_science.DataScienceClient";
const DEVOPS: &str = "devops.DevopsClient";

const TERMINATED: &[&str] = &["TERMINATED"];
const DELETED: &[&str] = &["DELETED"];

const VAULT_PARENT: ParentLookup = ParentLookup {
    list: OperationRef::new(KMS_VAULT, "list_vaults"),
    endpoint_field: "managementEndpoint",
};

const SCHEDULED: SpecialHandling = SpecialHandling::ScheduledDeletion { parent: None };

/// Deletion contracts for every supported kind
pub const BUILTIN_DESCRIPTORS: &[D] = &[
    // Compute
    D::new("Instance", COMPUTE, "terminate_instance")
        .with_wait("get_instance", TERMINATED)
        .with_dependencies(&["BootVolume", "Volume", "Subnet", "NetworkSecurityGroup"]),
    D::new("Image", COMPUTE, "delete_image").with_wait("get_image", DELETED),
    D::new("ConsoleHistory", COMPUTE, "delete_console_history"),
    D::new("VolumeAttachment", COMPUTE, "detach_volume").with_dependencies(&["Volume"]),
    D::new("BootVolumeAttachment", COMPUTE, "detach_boot_volume")
        .with_dependencies(&["BootVolume"]),
    D::new("VnicAttachment", COMPUTE, "detach_vnic").auto_managed(),
    D::new("InstanceConfiguration", COMPUTE_MGMT, "delete_instance_configuration"),
    D::new("InstancePool", COMPUTE_MGMT, "terminate_instance_pool")
        .with_dependencies(&["InstanceConfiguration", "Subnet"]),
    D::new("ClusterNetwork", COMPUTE_MGMT, "terminate_cluster_network")
        .with_dependencies(&["InstancePool"]),
    D::new(
        "AutoScalingConfiguration",
        "autoscaling.AutoScalingClient",
        "delete_auto_scaling_configuration",
    )
    .with_dependencies(&["InstancePool"]),
    // Block storage
    D::new("Volume", BLOCKSTORAGE, "delete_volume").with_wait("get_volume", TERMINATED),
    D::new("BootVolume", BLOCKSTORAGE, "delete_boot_volume")
        .with_wait("get_boot_volume", TERMINATED),
    D::new("VolumeBackup", BLOCKSTORAGE, "delete_volume_backup"),
    D::new("BootVolumeBackup", BLOCKSTORAGE, "delete_boot_volume_backup"),
    D::new("VolumeGroup", BLOCKSTORAGE, "delete_volume_group")
        .with_dependencies(&["Volume", "BootVolume"]),
    D::new("VolumeGroupBackup", BLOCKSTORAGE, "delete_volume_group_backup"),
    D::new("VolumeBackupPolicy", BLOCKSTORAGE, "delete_volume_backup_policy"),
    // Networking
    D::new("Vcn", NETWORK, "delete_vcn"),
    D::new("Subnet", NETWORK, "delete_subnet")
        .with_dependencies(&["Vcn", "RouteTable", "SecurityList", "DHCPOptions"]),
    D::new("InternetGateway", NETWORK, "delete_internet_gateway").with_dependencies(&["Vcn"]),
    D::new("NatGateway", NETWORK, "delete_nat_gateway").with_dependencies(&["Vcn"]),
    D::new("ServiceGateway", NETWORK, "delete_service_gateway").with_dependencies(&["Vcn"]),
    D::new("LocalPeeringGateway", NETWORK, "delete_local_peering_gateway")
        .with_dependencies(&["Vcn"]),
    D::new("RouteTable", NETWORK, "delete_route_table").with_dependencies(&["Vcn"]),
    D::new("SecurityList", NETWORK, "delete_security_list").with_dependencies(&["Vcn"]),
    D::new("DHCPOptions", NETWORK, "delete_dhcp_options").with_dependencies(&["Vcn"]),
    D::new("NetworkSecurityGroup", NETWORK, "delete_network_security_group")
        .with_dependencies(&["Vcn"]),
    D::new("Drg", NETWORK, "delete_drg"),
    D::new("DrgAttachment", NETWORK, "delete_drg_attachment").with_dependencies(&["Drg", "Vcn"]),
    D::new("PrivateIp", NETWORK, "delete_private_ip").with_dependencies(&["Subnet"]),
    D::new("PublicIp", NETWORK, "delete_public_ip").listed_by(NETWORK, "list_public_ips"),
    D::new("Vnic", NETWORK, "delete_vnic").auto_managed(),
    // Load balancing
    D::new(
        "LoadBalancer",
        "load_balancer.LoadBalancerClient",
        "delete_load_balancer",
    )
    .with_dependencies(&["Subnet", "NetworkSecurityGroup"]),
    D::new(
        "NetworkLoadBalancer",
        "network_load_balancer.NetworkLoadBalancerClient",
        "delete_network_load_balancer",
    )
    .with_dependencies(&["Subnet", "NetworkSecurityGroup"]),
    // Databases
    D::new("DbSystem", "database.DatabaseClient", "terminate_db_system")
        .with_dependencies(&["Subnet"]),
    D::new(
        "AutonomousDatabase",
        "database.DatabaseClient",
        "delete_autonomous_database",
    ),
    D::new("MysqlDbSystem", "mysql.DbSystemClient", "delete_db_system")
        .with_dependencies(&["Subnet"]),
    // Object storage
    D::new("Bucket", OBJECT_STORAGE, "delete_bucket")
        .with_id_field("name")
        .with_special(SpecialHandling::Bucket),
    // File storage
    D::new("FileSystem", "file_storage.FileStorageClient", "delete_file_system"),
    D::new("MountTarget", "file_storage.FileStorageClient", "delete_mount_target")
        .with_dependencies(&["Subnet", "NetworkSecurityGroup"]),
    D::new("Export", "file_storage.FileStorageClient", "delete_export")
        .with_dependencies(&["FileSystem", "MountTarget"]),
    D::new("ExportSet", "file_storage.FileStorageClient", "delete_export_set").auto_managed(),
    // Containers
    D::new(
        "Cluster",
        "container_engine.ContainerEngineClient",
        "delete_cluster",
    )
    .with_dependencies(&["Subnet", "Vcn"]),
    D::new(
        "NodePool",
        "container_engine.ContainerEngineClient",
        "delete_node_pool",
    )
    .with_dependencies(&["Cluster", "Subnet"]),
    D::new(
        "ContainerInstance",
        "container_instances.ContainerInstanceClient",
        "delete_container_instance",
    )
    .with_dependencies(&["Subnet"]),
    D::new(
        "ContainerRepository",
        "artifacts.ArtifactsClient",
        "delete_container_repository",
    )
    .listed_by("artifacts.ArtifactsClient", "list_container_repositories"),
    // Functions and gateways
    D::new("Application", "functions.FunctionsManagementClient", "delete_application")
        .with_dependencies(&["Subnet"]),
    D::new("Function", "functions.FunctionsManagementClient", "delete_function")
        .with_dependencies(&["Application"]),
    D::new("ApiGateway", "apigateway.GatewayClient", "delete_gateway")
        .with_dependencies(&["Subnet"]),
    D::new("ApiDeployment", "apigateway.DeploymentClient", "delete_deployment")
        .with_dependencies(&["ApiGateway"]),
    D::new("Bastion", "bastion.BastionClient", "delete_bastion").with_dependencies(&["Subnet"]),
    // Streaming and notifications
    D::new("StreamPool", "streaming.StreamAdminClient", "delete_stream_pool"),
    D::new("Stream", "streaming.StreamAdminClient", "delete_stream")
        .with_dependencies(&["StreamPool"]),
    D::new("OnsTopic", "ons.NotificationControlPlaneClient", "delete_topic"),
    D::new(
        "OnsSubscription",
        "ons.NotificationDataPlaneClient",
        "delete_subscription",
    )
    .with_dependencies(&["OnsTopic"]),
    D::new("Alarm", "monitoring.MonitoringClient", "delete_alarm")
        .with_dependencies(&["OnsTopic"]),
    // Logging
    D::new("LogGroup", LOGGING, "delete_log_group"),
    D::new("Log", LOGGING, "delete_log")
        .with_special(SpecialHandling::LogEntry)
        .with_dependencies(&["LogGroup"]),
    D::new(
        "ServiceConnector",
        "sch.ServiceConnectorClient",
        "delete_service_connector",
    )
    .with_dependencies(&["Log", "LogGroup", "Stream"]),
    D::new(
        "LogAnalyticsEntity",
        "log_analytics.LogAnalyticsClient",
        "delete_log_analytics_entity",
    )
    .with_special(SpecialHandling::Namespaced),
    // Vaults, keys and secrets
    D::new("Vault", KMS_VAULT, "schedule_vault_deletion").with_special(SCHEDULED),
    D::new("Key", KMS_MGMT, "schedule_key_deletion")
        .with_special(SpecialHandling::ScheduledDeletion {
            parent: Some(VAULT_PARENT),
        })
        .with_dependencies(&["Vault"]),
    D::new("VaultSecret", "vault.VaultsClient", "schedule_secret_deletion")
        .with_special(SCHEDULED)
        .with_dependencies(&["Vault", "Key"]),
    D::new(
        "CertificateAuthority",
        CERTIFICATES,
        "schedule_certificate_authority_deletion",
    )
    .with_special(SCHEDULED)
    .with_dependencies(&["Key"]),
    D::new("Certificate", CERTIFICATES, "schedule_certificate_deletion")
        .with_special(SCHEDULED)
        .with_dependencies(&["CertificateAuthority"]),
    // DNS
    D::new("CustomerDnsZone", "dns.DnsClient", "delete_zone"),
    D::new("DnsView", "dns.DnsClient", "delete_view"),
    D::new("DnsResolver", "dns.DnsClient", "delete_resolver").auto_managed(),
    // Identity
    D::new("Policy", IDENTITY, "delete_policy"),
    D::new("DynamicResourceGroup", IDENTITY, "delete_dynamic_group"),
    D::new("Compartment", IDENTITY, "delete_compartment"),
    // Developer services
    D::new("DataScienceProject", DATA_SCIENCE, "delete_project"),
    D::new("DataScienceNotebookSession", DATA_SCIENCE, "delete_notebook_session")
        .with_dependencies(&["DataScienceProject", "Subnet"]),
    D::new("DataScienceModel", DATA_SCIENCE, "delete_model")
        .with_dependencies(&["DataScienceProject"]),
    D::new(
        "DataScienceModelDeployment",
        DATA_SCIENCE,
        "delete_model_deployment",
    )
    .with_dependencies(&["DataScienceModel", "DataScienceProject"]),
    D::new("DevopsProject", DEVOPS, "delete_project"),
    D::new("DevopsRepository", DEVOPS, "delete_repository").with_dependencies(&["DevopsProject"]),
    D::new("OrmStack", "resource_manager.ResourceManagerClient", "delete_stack"),
];
