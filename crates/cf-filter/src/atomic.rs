use cf_core::Result;
use cf_net::NetClient;
use tokio::sync::Mutex as AsyncMutex;

/// Runs the three-step atomic-save / atomic-file-edit / atomic-commit
/// sequence (SPEC_FULL.md 4.F "Atomic commit protocol") under the
/// process-wide serializing lock. The lock is held across every `.await`
/// in this sequence by design — only one atomic editor may run at a time.
pub async fn commit(
    net: &NetClient,
    atomic_file: &str,
    cmds: Vec<Vec<String>>,
    commit_lock: &AsyncMutex<()>,
) -> Result<()> {
    let _guard = commit_lock.lock().await;

    net.exec_argv(net.atomic_save_argv(atomic_file)).await?;

    for cmd in cmds {
        if cmd.is_empty() {
            continue;
        }
        net.exec_argv(cmd).await?;
    }

    net.exec_argv(net.atomic_commit_argv(atomic_file)).await?;

    if let Err(err) = net.exec_argv(vec!["rm".to_string(), "-f".to_string(), atomic_file.to_string()]).await {
        tracing::warn!(%atomic_file, %err, "failed to remove atomic edit file");
    }

    Ok(())
}
