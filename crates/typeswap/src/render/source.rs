// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Swap source: helper definitions, then every `byte_swap_<T>` followed by
//! every `bit_swap_<T>`, each group in dependency order.

use crate::model::Project;
use crate::render::swap_signature;
use crate::swap::{BitSwapOp, BitSwapPlan, Plans, SwapEntry, SwapPlan, SwapStrategy};

const HELPERS: &str = "\
uint32 *p32, tmp_32;
uint64 *p64, tmp_64;
#define swap_float(pIn, pOut) p32 = (uint32*) pIn; tmp_32 = bswap_32(*p32); memcpy(pOut, &tmp_32, 4)
#define swap_double(pIn, pOut) p64 = (uint64*) pIn; tmp_64 = bswap_64(*p64); memcpy(pOut, &tmp_64, 8)
#define swap_pointer_8(pIn, pOut) p64 = (uint64*) pIn; tmp_64 = bswap_64(*p64); memcpy(pOut, &tmp_64, 8)
#define swap_pointer_4(pIn, pOut) p32 = (uint32*) pIn; tmp_32 = bswap_32(*p32); memcpy(pOut, &tmp_32, 4)

/* Swaps a bit field of value 'val' containing 'num' bits, and returns the resulting 'mirrored' value */
static int bit_field_swap(int val, int num)
{
   int ret_val = 0, n_1 = num - 1, i = 0;
   for (i = 0; i < num; i++)
   {
      ret_val|= (((val>>i) &1) << (n_1 - i));
   }
   return ret_val;
}

/* Reverses the order of the bits in a n-byte object (only supports 1 <= n <= 8) */
static void reflect_bits(char *data, int n)
{
   if (n > 8) return;
   int i = 0;
   /* Need to go through all the bytes, since 2 nibbles (1 byte) are reflected each iteration of the 'for' loop */
   for (i = 0; i < n; i++)
   {
      unsigned char *t1 = (unsigned char *) &(data[i]);
      unsigned char *t2 = (unsigned char *) &(data[n - 1 - i]);
      unsigned char v1 = ((*t1 & 1)  << 7) + ((*t1 &  2) << 5) + ((*t1 &  4)<<3) + ((*t1 &   8)<<1);
      unsigned char v2 = ((*t2 & 16) >> 1) + ((*t2 & 32) >> 3) + ((*t2 & 64)>>5) + ((*t2 & 128)>>7);
      *t1 = ((*t1) & 0xF0) | v2;
      *t2 = ((*t2) & 0x0F) | v1;
   }
}
";

const BYTE_SWAP_COMMENT: &str = concat!(
    "/* inPtr and outPtr are pointers to the input and output data. 'direction' is a flag for if the conversion \n",
    "   is from foreign to local endian (direction = 1), or from native to foreign byte order (direction = 0) */\n",
);

const BIT_SWAP_COMMENT: &str = concat!(
    "/* inPtr and outPtr are pointers to the input and output data. 'direction' is a flag for if the conversion \n",
    "   is from foreign-to-local endian (direction = 1), or from native to foreign byte order (direction = 0) */\n",
);

/// Render the complete swap source.
pub fn render_source(project: &Project, plans: &Plans, banner: &str, base_name: &str) -> String {
    let mut out = String::from(banner);
    out.push_str("#include <byteswap.h>\n#include <string.h>\n");
    out.push_str(&format!("#include \"{base_name}.h\"\n\n"));
    out.push_str(HELPERS);

    for plan in &plans.swaps {
        out.push_str(&render_byte_swap(project, plan));
    }
    for plan in plans.bit_swaps.iter().flatten() {
        out.push_str(&render_bit_swap(project, plan));
    }
    out
}

/// Function body writer that declares the loop counter on first use.
struct Body {
    text: String,
    counter_declared: bool,
}

impl Body {
    fn new() -> Self {
        Self {
            text: String::new(),
            counter_declared: false,
        }
    }

    fn line(&mut self, statement: &str) {
        self.text.push_str("   ");
        self.text.push_str(statement);
        self.text.push('\n');
    }

    fn looped(&mut self, count: usize, statement: &str) {
        if !self.counter_declared {
            self.counter_declared = true;
            self.line("int i = 0;");
        }
        self.text.push_str(&format!(
            "   for (i = 0; i < {count}; i++)\n   {{\n      {statement}\n   }}\n"
        ));
    }

    fn guarded(&mut self, condition: &str, statement: &str) {
        self.text.push_str(&format!(
            "   if ({condition})\n   {{\n      {statement}\n   }}\n"
        ));
    }
}

/// Member access for one element; multi-dimensional arrays are walked
/// through a pointer to their first element.
fn element(ptr: &str, name: &str, extents: &[usize]) -> String {
    match extents.len() {
        0 => format!("{ptr}->{name}"),
        1 => format!("{ptr}->{name}[i]"),
        n => format!("(&{ptr}->{name}{})[i]", "[0]".repeat(n)),
    }
}

fn swap_call(entry: &SwapEntry) -> Option<String> {
    let input = element("inPtr", &entry.name, &entry.extents);
    let output = element("outPtr", &entry.name, &entry.extents);
    let word = |op: &str| format!("{output} = {op}({input});");
    let helper = |op: &str| format!("{op}(&({input}), &({output}));");

    match entry.strategy {
        SwapStrategy::Word16 => Some(word("bswap_16")),
        SwapStrategy::Word32 => Some(word("bswap_32")),
        SwapStrategy::Word64 => Some(word("bswap_64")),
        SwapStrategy::Float32 => Some(helper("swap_float")),
        SwapStrategy::Double64 => Some(helper("swap_double")),
        SwapStrategy::Pointer32 => Some(helper("swap_pointer_4")),
        SwapStrategy::Pointer64 => Some(helper("swap_pointer_8")),
        SwapStrategy::SingleByte | SwapStrategy::BitField | SwapStrategy::Nested { .. } => None,
    }
}

fn render_byte_swap(project: &Project, plan: &SwapPlan) -> String {
    let signature = swap_signature("byte", &plan.name);
    let mut body = Body::new();

    for entry in &plan.entries {
        match entry.strategy {
            SwapStrategy::BitField => {}
            SwapStrategy::SingleByte if entry.is_array() => body.line(&format!(
                "memmove(outPtr->{0}, inPtr->{0}, sizeof(outPtr->{0}));",
                entry.name
            )),
            SwapStrategy::SingleByte => {
                body.line(&format!("outPtr->{0} = inPtr->{0};", entry.name))
            }
            SwapStrategy::Nested { target } => {
                let call = format!(
                    "byte_swap_{}(&({}), &({}), direction);",
                    project.structure(target).name,
                    element("inPtr", &entry.name, &entry.extents),
                    element("outPtr", &entry.name, &entry.extents)
                );
                if entry.is_array() {
                    body.looped(entry.element_count(), &call);
                } else {
                    body.line(&call);
                }
            }
            _ => {
                let Some(call) = swap_call(entry) else {
                    continue;
                };
                if entry.is_array() {
                    body.looped(entry.element_count(), &call);
                } else {
                    body.line(&call);
                }
            }
        }
    }

    if plan.calls_bit_swap {
        body.line(&format!(
            "bit_swap_{}(inPtr, outPtr, direction); /* Swap all bit fields in this structure */",
            plan.name
        ));
    }

    format!(
        "\n{BYTE_SWAP_COMMENT}inline void {signature}\n{{\n{}}} /* End of {signature} */\n",
        body.text
    )
}

fn render_bit_swap(project: &Project, plan: &BitSwapPlan) -> String {
    let signature = swap_signature("bit", &plan.name);
    let mut body = Body::new();

    for op in &plan.ops {
        match op {
            BitSwapOp::ReflectInput { offset, size } => body.guarded(
                "direction",
                &format!("reflect_bits(&(((char*)(inPtr))[{offset}]), {size});"),
            ),
            BitSwapOp::ReflectOutput { offset, size } => body.guarded(
                "!direction",
                &format!("reflect_bits(&(((char*)(outPtr))[{offset}]), {size});"),
            ),
            BitSwapOp::Mirror { field, bits, .. } => body.line(&format!(
                "outPtr->{field} = bit_field_swap(inPtr->{field}, {bits});"
            )),
            BitSwapOp::Copy { field } => body.line(&format!("outPtr->{field} = inPtr->{field};")),
            BitSwapOp::Nested {
                field,
                target,
                extents,
                ..
            } => {
                let call = format!(
                    "bit_swap_{}(&({}), &({}), direction);",
                    project.structure(*target).name,
                    element("inPtr", field, extents),
                    element("outPtr", field, extents)
                );
                if extents.is_empty() {
                    body.line(&call);
                } else {
                    body.looped(extents.iter().product(), &call);
                }
            }
        }
    }

    format!(
        "\n{BIT_SWAP_COMMENT}inline void {signature}\n{{\n{}}} /* End of {signature} */\n",
        body.text
    )
}
