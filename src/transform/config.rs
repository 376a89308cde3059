//! Configuration for the `ItemInWorldManager` transformation.
//!
//! Every symbolic constant the transformation relies on lives here, written in canonical form.
//! Names that have an SRG counterpart are translated at patch time by
//! [`crate::mapping::NameResolver`].

/// Configuration for [`crate::transform::VeinMinerTransformer`].
///
/// # Examples
///
/// ```rust
/// use veinpatch::TransformerConfig;
///
/// let config = TransformerConfig::default().with_handler_method("blockBroken");
/// assert_eq!(config.target_class, "net.minecraft.item.ItemInWorldManager");
/// assert_eq!(
///     config.handler_descriptor(
///         "Lnet/minecraft/world/World;",
///         "Lnet/minecraft/entity/player/EntityPlayerMP;",
///     ),
///     "(Lnet/minecraft/world/World;Lnet/minecraft/entity/player/EntityPlayerMP;IIIZ)V"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerConfig {
    /// Binary name of the class to patch, as passed to a class-loading hook.
    pub target_class: String,

    /// Canonical name of the method to patch.
    pub target_method: String,

    /// Canonical name of the call whose result is handed to the handler.
    pub anchor_callee: String,

    /// Canonical name of the world field read off the receiver.
    pub world_field: String,

    /// Canonical name of the player field read off the receiver.
    pub player_field: String,

    /// Internal name of the handler class.
    pub handler_class: String,

    /// Static field of the handler class holding the handler instance.
    pub handler_field: String,

    /// Handler method invoked with the captured result.
    pub handler_method: String,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            target_class: "net.minecraft.item.ItemInWorldManager".to_string(),
            target_method: "uncheckedTryHarvestBlock".to_string(),
            anchor_callee: "tryHarvestBlock".to_string(),
            world_field: "theWorld".to_string(),
            player_field: "thisPlayerMP".to_string(),
            handler_class: "portablejim/veinminer/VeinMiner".to_string(),
            handler_field: "instance".to_string(),
            handler_method: "blockMined".to_string(),
        }
    }
}

impl TransformerConfig {
    /// Creates a configuration with the default targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the binary name of the class to patch.
    #[must_use]
    pub fn with_target_class(mut self, name: impl Into<String>) -> Self {
        self.target_class = name.into();
        self
    }

    /// Sets the canonical name of the method to patch.
    #[must_use]
    pub fn with_target_method(mut self, name: impl Into<String>) -> Self {
        self.target_method = name.into();
        self
    }

    /// Sets the canonical name of the anchor call.
    #[must_use]
    pub fn with_anchor_callee(mut self, name: impl Into<String>) -> Self {
        self.anchor_callee = name.into();
        self
    }

    /// Sets the canonical names of the world and player fields.
    #[must_use]
    pub fn with_context_fields(
        mut self,
        world: impl Into<String>,
        player: impl Into<String>,
    ) -> Self {
        self.world_field = world.into();
        self.player_field = player.into();
        self
    }

    /// Sets the handler class and the static field holding its instance.
    #[must_use]
    pub fn with_handler(mut self, class: impl Into<String>, field: impl Into<String>) -> Self {
        self.handler_class = class.into();
        self.handler_field = field.into();
        self
    }

    /// Sets the handler method name.
    #[must_use]
    pub fn with_handler_method(mut self, name: impl Into<String>) -> Self {
        self.handler_method = name.into();
        self
    }

    /// Field descriptor of the handler instance field.
    #[must_use]
    pub fn handler_type(&self) -> String {
        format!("L{};", self.handler_class)
    }

    /// Descriptor of the handler method for the given world and player field descriptors.
    #[must_use]
    pub fn handler_descriptor(&self, world: &str, player: &str) -> String {
        format!("({world}{player}IIIZ)V")
    }

    /// Whether a class-loading hook's transformed name designates the target class.
    ///
    /// Accepts both binary (`a.b.C`) and internal (`a/b/C`) spellings.
    #[must_use]
    pub fn is_target(&self, transformed_name: &str) -> bool {
        transformed_name.len() == self.target_class.len()
            && transformed_name
                .bytes()
                .zip(self.target_class.bytes())
                .all(|(a, b)| a == b || (a == b'/' && b == b'.') || (a == b'.' && b == b'/'))
    }
}
