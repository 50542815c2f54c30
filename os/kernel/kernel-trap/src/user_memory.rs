use crate::env::{EnvId, Environments};
use kernel_memory_addresses::VirtualAddress;
use kernel_vmem::{AddressSpace, PagePermissions, PhysMapper, Tlb, UserMemoryViolation, check_user_range};
use log::error;

/// [`check_user_range`] on behalf of `env`, destroying `env` if the range is
/// not accessible to it.
///
/// # Errors
/// The violation, after `env` has been destroyed.
pub fn assert_user_range<E, M, T>(
    envs: &mut E,
    env: EnvId,
    aspace: &AddressSpace<'_, M, T>,
    va: VirtualAddress,
    len: u32,
    perm: PagePermissions,
) -> Result<(), UserMemoryViolation>
where
    E: Environments,
    M: PhysMapper,
    T: Tlb,
{
    check_user_range(aspace, va, len, perm).inspect_err(|violation| {
        error!(
            "[{env}] user_mem_check assertion failure for va {:08x}",
            violation.address.as_u32()
        );
        envs.destroy(env);
    })
}
