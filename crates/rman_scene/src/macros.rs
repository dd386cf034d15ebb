//! Code generation for the interface calls.
//!
//! [`define_calls!`] takes one line per call and generates, from that single
//! table:
//!
//! - the [`RiCall`](crate::RiCall) sum type,
//! - its request mapping and parameter-list accessors,
//! - the [`RenderCallbacks`](crate::RenderCallbacks) trait with a
//!   `pre_`/`do_`/`post_` triplet per call,
//! - the field dispatcher used by the default generic hooks,
//! - positional RIB argument emission.
//!
//! A call marked `[params]` carries a trailing [`ParameterList`](rman_core::ParameterList)
//! named `params`.

macro_rules! define_calls {
    (@some $p:ident) => { Some($p) };
    (@some) => { None };

    (
        $(
            $(#[$meta:meta])*
            $variant:ident $( [$params:ident] )? { $( $field:ident : $ty:ty ),* $(,)? }
        ),* $(,)?
    ) => {
        paste::paste! {
            /// One variant per interface call, carrying the call's arguments.
            #[derive(Debug, Clone, PartialEq)]
            pub enum RiCall {
                $(
                    $(#[$meta])*
                    $variant { $( $field: $ty, )* $( $params: ParameterList, )? },
                )*
            }

            impl RiCall {
                /// The request this call represents.
                #[must_use]
                pub fn request(&self) -> Request {
                    match self {
                        $( Self::$variant { .. } => Request::$variant, )*
                    }
                }

                /// The trailing parameter list, for calls that have one.
                #[must_use]
                pub fn params(&self) -> Option<&ParameterList> {
                    match self {
                        $( Self::$variant { $( $params, )? .. } => define_calls!(@some $( $params )?), )*
                    }
                }

                pub fn params_mut(&mut self) -> Option<&mut ParameterList> {
                    match self {
                        $( Self::$variant { $( $params, )? .. } => define_calls!(@some $( $params )?), )*
                    }
                }

                /// Writes the positional arguments and the parameter list.
                pub(crate) fn write_rib_args<W: std::io::Write>(
                    &self,
                    w: &mut $crate::rib::RibWriter<W>,
                    ignore: &[Token],
                ) -> std::io::Result<()> {
                    match self {
                        $(
                            #[allow(unused_variables)]
                            Self::$variant { $( $field, )* $( $params, )? } => {
                                $( $crate::rib::RibArg::write_rib($field, w)?; )*
                                $( w.write_params($params, ignore)?; )?
                            }
                        )*
                    }
                    Ok(())
                }
            }

            /// Renderer callbacks.
            ///
            /// Every call has a `pre_`, a `do_` and a `post_` method receiving
            /// the call's fields; all default to doing nothing. The generic
            /// hooks [`pre_command`](Self::pre_command),
            /// [`do_command`](Self::do_command) and
            /// [`post_command`](Self::post_command) receive the whole command
            /// and forward to the per-call methods unless overridden.
            pub trait RenderCallbacks {
                fn pre_command(&mut self, state: &RenderState, cmd: &RiCommand) -> Result<()> {
                    dispatch_fields(self, Phase::Pre, state, cmd)
                }

                fn do_command(&mut self, state: &RenderState, cmd: &RiCommand) -> Result<()> {
                    dispatch_fields(self, Phase::Do, state, cmd)
                }

                fn post_command(&mut self, state: &RenderState, cmd: &RiCommand) -> Result<()> {
                    dispatch_fields(self, Phase::Post, state, cmd)
                }

                $(
                    #[allow(unused_variables)]
                    fn [<pre_ $variant:snake>](
                        &mut self,
                        state: &RenderState,
                        $( $field: &$ty, )*
                        $( $params: &ParameterList, )?
                    ) -> Result<()> {
                        Ok(())
                    }

                    #[allow(unused_variables)]
                    fn [<do_ $variant:snake>](
                        &mut self,
                        state: &RenderState,
                        $( $field: &$ty, )*
                        $( $params: &ParameterList, )?
                    ) -> Result<()> {
                        Ok(())
                    }

                    #[allow(unused_variables)]
                    fn [<post_ $variant:snake>](
                        &mut self,
                        state: &RenderState,
                        $( $field: &$ty, )*
                        $( $params: &ParameterList, )?
                    ) -> Result<()> {
                        Ok(())
                    }
                )*
            }

            /// Calls the per-call method of `phase` with the command's fields.
            pub fn dispatch_fields<C: RenderCallbacks + ?Sized>(
                callbacks: &mut C,
                phase: Phase,
                state: &RenderState,
                cmd: &RiCommand,
            ) -> Result<()> {
                match &cmd.call {
                    $(
                        RiCall::$variant { $( $field, )* $( $params, )? } => match phase {
                            Phase::Pre => callbacks.[<pre_ $variant:snake>](state, $( $field, )* $( $params, )?),
                            Phase::Do => callbacks.[<do_ $variant:snake>](state, $( $field, )* $( $params, )?),
                            Phase::Post => callbacks.[<post_ $variant:snake>](state, $( $field, )* $( $params, )?),
                        },
                    )*
                }
            }
        }
    };
}

pub(crate) use define_calls;
