//! Procedural macros for the `aoc-framework` crate.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Error, Expr, Item, ItemImpl, ItemStruct, Type, parse_macro_input};

/// Generate a `SolutionRunner` implementation for a struct or impl block.
///
/// Every property is required:
///
/// - `name` - an expression evaluating to `&str`, the solution's display name.
/// - `parsed` - the type implementing `ParseData` that input is parsed into.
/// - `part_one` - the type implementing `Solution<PartOne>` over the parsed type.
/// - `part_two` - the type implementing `Solution<PartTwo>` over the parsed type.
///
/// ```ignore
/// #[solution_runner(name = "Day 20", parsed = ModuleGraph, part_one = Day20, part_two = Day20)]
/// impl super::AdventOfCode2023<20> {}
/// ```
///
/// A compile error is emitted for a missing, duplicated or unknown property, or when applied to
/// anything other than a struct or impl block.
#[proc_macro_attribute]
pub fn solution_runner(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut name_expr_opt: Option<Expr> = None;
    let mut parsed_ty_opt: Option<Type> = None;
    let mut part_one_ty_opt: Option<Type> = None;
    let mut part_two_ty_opt: Option<Type> = None;

    let solution_runner_parser = syn::meta::parser(|meta| {
        macro_rules! set_once {
            ($slot:ident, $key:literal) => {{
                if $slot.is_some() {
                    return Err(meta.error(concat!("duplicate '", $key, "' property")));
                }
                $slot = Some(meta.value()?.parse()?);
                Ok(())
            }};
        }

        if meta.path.is_ident("name") {
            set_once!(name_expr_opt, "name")
        } else if meta.path.is_ident("parsed") {
            set_once!(parsed_ty_opt, "parsed")
        } else if meta.path.is_ident("part_one") {
            set_once!(part_one_ty_opt, "part_one")
        } else if meta.path.is_ident("part_two") {
            set_once!(part_two_ty_opt, "part_two")
        } else {
            Err(meta.error("unsupported solution runner property"))
        }
    });
    parse_macro_input!(args with solution_runner_parser);

    let (Some(name_expr), Some(parsed_ty), Some(part_one_ty), Some(part_two_ty)) =
        (name_expr_opt, parsed_ty_opt, part_one_ty_opt, part_two_ty_opt)
    else {
        return Error::new(
            proc_macro2::Span::call_site(),
            "#[solution_runner] requires the properties 'name', 'parsed', 'part_one' and 'part_two'",
        )
        .to_compile_error()
        .into();
    };

    let original_input = proc_macro2::TokenStream::from(input.clone());
    let runner_ty = match parse_macro_input!(input as Item) {
        Item::Struct(ItemStruct { ident, .. }) => quote! { #ident },
        Item::Impl(ItemImpl { self_ty, .. }) => quote! { #self_ty },
        _ => {
            return Error::new(
                proc_macro2::Span::call_site(),
                "the #[solution_runner] macro can only be applied to a struct or an impl block",
            )
            .to_compile_error()
            .into();
        }
    };

    TokenStream::from(quote! {
        #original_input

        impl aoc_framework::runner::SolutionRunner for #runner_ty {
            fn run(
                input: &str,
                handler: &mut dyn aoc_framework::runner::OutputHandler,
                timed: bool
            ) -> aoc_framework::DynamicResult<()> {
                aoc_framework::runner::solve_parsed_solution::<
                    #parsed_ty,
                    #part_one_ty,
                    #part_two_ty
                >(#name_expr, input, handler, timed)
            }
        }
    })
}
